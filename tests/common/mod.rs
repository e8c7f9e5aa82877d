//! 组件测试共用的示例插件
//!
//! 每个部件都依赖单例 `HostLog`，通过它记录注册顺序。

#![allow(dead_code)]

use parking_lot::Mutex;
use plugkit::component::{
    AdminPage, AjaxHandler, Component, ComponentManifest, CustomTaxonomy, PostType, RestEndpoint,
    Shortcode, Widget,
};
use plugkit::hooks::{callback, HookRegistry};
use plugkit::infrastructure::container::{Arguments, Blueprint, Container};
use std::sync::Arc;

/// 模拟宿主记录的注册事件
#[derive(Default)]
pub struct HostLog {
    entries: Mutex<Vec<String>>,
}

impl HostLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

fn log_arg(args: &Arguments) -> anyhow::Result<Arc<HostLog>> {
    args.service::<HostLog>(0)
}

pub struct SettingsPage(Arc<HostLog>);

impl AdminPage for SettingsPage {
    fn register(&self, hooks: &dyn HookRegistry) -> anyhow::Result<()> {
        self.0.push("admin_page:settings");
        let log = self.0.clone();
        hooks.on_event(
            "admin_menu",
            callback(move || {
                log.push("menu:settings");
                Ok(())
            }),
        );
        Ok(())
    }
}

pub struct BookPostType(Arc<HostLog>);

impl PostType for BookPostType {
    fn register(&self) -> anyhow::Result<()> {
        self.0.push("post_type:book");
        Ok(())
    }
}

pub struct SearchHandler(Arc<HostLog>);

impl AjaxHandler for SearchHandler {
    fn register(&self, _hooks: &dyn HookRegistry) -> anyhow::Result<()> {
        self.0.push("ajax:search");
        Ok(())
    }
}

pub struct BookListShortcode(Arc<HostLog>);

impl Shortcode for BookListShortcode {
    fn register(&self, _hooks: &dyn HookRegistry) -> anyhow::Result<()> {
        self.0.push("shortcode:book_list");
        Ok(())
    }
}

pub struct BooksEndpoint(Arc<HostLog>);

impl RestEndpoint for BooksEndpoint {
    fn register_routes(&self) -> anyhow::Result<()> {
        self.0.push("rest:books");
        Ok(())
    }
}

pub struct RecentBooksWidget(Arc<HostLog>);

impl Widget for RecentBooksWidget {
    fn register_widget(&self) -> anyhow::Result<()> {
        self.0.push("widget:recent_books");
        Ok(())
    }
}

pub struct GenreTaxonomy(Arc<HostLog>);

impl CustomTaxonomy for GenreTaxonomy {
    fn register_taxonomy(&self) -> anyhow::Result<()> {
        self.0.push("taxonomy:genre");
        Ok(())
    }
}

pub struct LibraryComponent(Arc<HostLog>);

impl Component for LibraryComponent {
    fn manifest(&self) -> ComponentManifest {
        ComponentManifest::new()
            .admin_page("SettingsPage")
            .post_type("BookPostType")
            .sub_component("ReviewsComponent")
            .ajax_handler("SearchHandler")
            .shortcode("BookListShortcode")
            .rest_endpoint("BooksEndpoint")
            .widget("RecentBooksWidget")
            .custom_taxonomy("GenreTaxonomy")
    }

    fn register(&self, _hooks: &dyn HookRegistry) -> anyhow::Result<()> {
        self.0.push("component:library");
        Ok(())
    }
}

pub struct ReviewsComponent(Arc<HostLog>);

impl Component for ReviewsComponent {
    fn manifest(&self) -> ComponentManifest {
        ComponentManifest::new().ajax_handler("SearchHandler")
    }

    fn register(&self, _hooks: &dyn HookRegistry) -> anyhow::Result<()> {
        self.0.push("component:reviews");
        Ok(())
    }
}

/// 注册示例插件的全部蓝图，`HostLog` 为单例
pub fn library_container() -> Container {
    let container = Container::new();
    container.register_blueprint(Blueprint::class("HostLog").construct(|_| Ok(HostLog::default())));
    container.singleton("HostLog");

    container.register_blueprint(
        Blueprint::class("SettingsPage")
            .depends_on("log", "HostLog")
            .construct(|args| Ok(Arc::new(SettingsPage(log_arg(args)?)) as Arc<dyn AdminPage>)),
    );
    container.register_blueprint(
        Blueprint::class("BookPostType")
            .depends_on("log", "HostLog")
            .construct(|args| Ok(Arc::new(BookPostType(log_arg(args)?)) as Arc<dyn PostType>)),
    );
    container.register_blueprint(
        Blueprint::class("SearchHandler")
            .depends_on("log", "HostLog")
            .construct(|args| Ok(Arc::new(SearchHandler(log_arg(args)?)) as Arc<dyn AjaxHandler>)),
    );
    container.register_blueprint(
        Blueprint::class("BookListShortcode")
            .depends_on("log", "HostLog")
            .construct(|args| {
                Ok(Arc::new(BookListShortcode(log_arg(args)?)) as Arc<dyn Shortcode>)
            }),
    );
    container.register_blueprint(
        Blueprint::class("BooksEndpoint")
            .depends_on("log", "HostLog")
            .construct(|args| Ok(Arc::new(BooksEndpoint(log_arg(args)?)) as Arc<dyn RestEndpoint>)),
    );
    container.register_blueprint(
        Blueprint::class("RecentBooksWidget")
            .depends_on("log", "HostLog")
            .construct(|args| Ok(Arc::new(RecentBooksWidget(log_arg(args)?)) as Arc<dyn Widget>)),
    );
    container.register_blueprint(
        Blueprint::class("GenreTaxonomy")
            .depends_on("log", "HostLog")
            .construct(|args| {
                Ok(Arc::new(GenreTaxonomy(log_arg(args)?)) as Arc<dyn CustomTaxonomy>)
            }),
    );
    container.register_blueprint(
        Blueprint::class("LibraryComponent")
            .depends_on("log", "HostLog")
            .construct(|args| Ok(Arc::new(LibraryComponent(log_arg(args)?)) as Arc<dyn Component>)),
    );
    container.register_blueprint(
        Blueprint::class("ReviewsComponent")
            .depends_on("log", "HostLog")
            .construct(|args| Ok(Arc::new(ReviewsComponent(log_arg(args)?)) as Arc<dyn Component>)),
    );
    container
}

pub fn host_log(container: &Container) -> Arc<HostLog> {
    container.get_as::<HostLog>("HostLog").unwrap()
}
