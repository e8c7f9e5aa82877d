//! 示例插件：注册一个组件并模拟宿主依次触发生命周期事件
//!
//! 运行：`RUST_LOG=plugkit=debug cargo run --example simple_plugin`

use plugkit::component::{AdminPage, Component, ComponentManifest, PostType};
use plugkit::hooks::{self, EventBus, HookRegistry};
use plugkit::infrastructure::container::{Blueprint, Builtin};
use plugkit::logging::{init_logging, LoggingSettings};
use plugkit::{ComponentError, Container, FrameworkConfig, Plugin, StartUp};
use serde_json::json;
use std::sync::Arc;

struct Greeter {
    greeting: String,
}

struct WelcomePage {
    greeter: Arc<Greeter>,
}

impl AdminPage for WelcomePage {
    fn register(&self, hooks: &dyn HookRegistry) -> anyhow::Result<()> {
        let greeter = self.greeter.clone();
        hooks.on_event(
            hooks::ADMIN_NOTICES,
            hooks::callback(move || {
                println!("[notice] {}", greeter.greeting);
                Ok(())
            }),
        );
        Ok(())
    }
}

struct EventPostType;

impl PostType for EventPostType {
    fn register(&self) -> anyhow::Result<()> {
        println!("[post type] event");
        Ok(())
    }
}

struct EventsComponent;

impl Component for EventsComponent {
    fn manifest(&self) -> ComponentManifest {
        ComponentManifest::new()
            .admin_page("WelcomePage")
            .post_type("EventPostType")
    }

    fn register(&self, _hooks: &dyn HookRegistry) -> anyhow::Result<()> {
        println!("[component] events registered");
        Ok(())
    }
}

struct EventsPlugin;

impl Plugin for EventsPlugin {
    fn startup(&self, container: &Container) -> anyhow::Result<()> {
        container.register_blueprint(
            Blueprint::class("Greeter")
                .param("greeting", Builtin::String, Some(json!("Welcome to the events plugin")))
                .construct(|args| {
                    Ok(Greeter {
                        greeting: args.value(0)?.unwrap_or_default(),
                    })
                }),
        );
        container.singleton("Greeter");

        container.register_blueprint(
            Blueprint::class("WelcomePage")
                .depends_on("greeter", "Greeter")
                .construct(|args| {
                    Ok(Arc::new(WelcomePage {
                        greeter: args.service::<Greeter>(0)?,
                    }) as Arc<dyn AdminPage>)
                }),
        );
        container.register_blueprint(
            Blueprint::class("EventPostType")
                .construct(|_| Ok(Arc::new(EventPostType) as Arc<dyn PostType>)),
        );
        container.register_blueprint(
            Blueprint::class("EventsComponent")
                .construct(|_| Ok(Arc::new(EventsComponent) as Arc<dyn Component>)),
        );
        Ok(())
    }

    fn components(&self, startup: &mut StartUp) -> Result<(), ComponentError> {
        startup.add_component("EventsComponent")
    }

    fn init(&self) -> anyhow::Result<()> {
        println!("[init] events plugin");
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = FrameworkConfig::from_toml_str(
        r#"
[plugin]
name = "events"

[logging]
format = "compact"
"#,
    )?;
    init_logging(&config.logging)?;

    let bus = Arc::new(EventBus::new());
    let startup = StartUp::boot_with_config(Arc::new(EventsPlugin), config, bus.clone())?;

    for event in [hooks::AFTER_SETUP_THEME, hooks::INIT, hooks::ADMIN_INIT, hooks::ADMIN_NOTICES] {
        let ran = bus.do_action(event)?;
        println!("{event}: {ran} callback(s)");
    }

    let stats = startup.container().stats();
    println!(
        "resolutions: {}, singleton hit rate: {:.0}%",
        stats.total(),
        stats.hit_rate() * 100.0
    );
    Ok(())
}
