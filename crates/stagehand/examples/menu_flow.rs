//! Menu -> level -> menu flow behind a loading screen.
//!
//! Run with: `RUST_LOG=debug cargo run -p stagehand --example menu_flow`

use std::rc::Rc;

use stagehand::prelude::*;

struct MainMenu;

impl State for MainMenu {
    fn on_start(&mut self, _manager: &StateManager) {
        tracing::info!("main menu shown");
    }

    fn on_end(&mut self, _manager: &StateManager) {
        tracing::info!("main menu hidden");
    }
}

struct Level {
    spawn: [f32; 2],
}

impl State for Level {
    fn on_pre_start(&mut self, _manager: &StateManager) {
        tracing::info!(spawn = ?self.spawn, "level preparing");
    }

    fn on_start(&mut self, _manager: &StateManager) {
        tracing::info!("level running");
    }
}

#[derive(Default)]
struct LoadingScreen {
    last_message: Option<String>,
}

impl State for LoadingScreen {
    fn on_start(&mut self, _manager: &StateManager) {
        tracing::info!("loading screen up");
    }

    fn on_loading_progress(&mut self, _manager: &StateManager, message: &str) {
        tracing::info!(progress = message, "loading");
        self.last_message = Some(message.to_owned());
    }

    fn on_post_end(&mut self, _manager: &StateManager) {
        tracing::info!(last = ?self.last_message, "loading screen down");
    }
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let bus = Rc::new(LocalBus::new());
    let journal = TransitionJournal::attach(&*bus);
    let manager = StateManager::with_loading_state(
        bus,
        StateHandle::new("loading", LoadingScreen::default()),
    );
    let mut loader = ScriptedLoader::new(LoaderConfig {
        ticks_per_step: 2,
        steps: vec!["textures".into(), "audio".into(), "navmesh".into()],
    });

    let menu = StateHandle::new("menu", MainMenu);
    let level = StateHandle::new("level", Level { spawn: [4.0, 2.0] });

    for target in [menu.clone(), level, menu] {
        manager.set_state(Some(target))?;
        let ticks = loader
            .run_to_completion(&manager, 1_000)?
            .ok_or_else(|| anyhow::anyhow!("loading did not finish"))?;
        tracing::info!(
            state = manager.state().as_ref().map(StateHandle::name),
            ticks,
            "transition finished"
        );
    }

    // Inspector row for the level's spawn point.
    let mut row = create_editor(&AttributeInfo::new("Spawn", ValueKind::Vector2), 0, 0)
        .ok_or_else(|| anyhow::anyhow!("no editor for Vector2"))?;
    set_value(&mut row.widget, &EditorValue::Vector2([4.0, 2.0]));
    tracing::info!(row = %serde_json::to_string(&row)?, "spawn editor");

    let diagnostics = manager.diagnostics();
    tracing::info!(
        started = diagnostics.transitions_started,
        completed = diagnostics.transitions_completed,
        progress = diagnostics.progress_updates,
        "session summary"
    );
    println!("{}", journal.to_json()?);
    Ok(())
}
