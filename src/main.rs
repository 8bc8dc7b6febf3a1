use macroquad::prelude::*;
use tracing::warn;

use launchpad::app::ExhibitController;
use launchpad::config::ExhibitSettings;
use launchpad::hardware::ConsoleBridge;
use launchpad::input::poll_frame_input;
use launchpad::render::TextureCache;
use launchpad::util::logging::init_logging;

fn window_conf() -> Conf {
    Conf {
        window_title: "launchpad".to_owned(),
        window_width: 1920,
        window_height: 1080,
        fullscreen: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let settings = ExhibitSettings::load();
    if let Err(e) = init_logging(settings.log_dir.as_deref(), settings.verbose) {
        eprintln!("failed to initialize logging: {e:#}");
    }

    // A missing console is not fatal: the exhibit runs on direct input.
    let bridge = match ConsoleBridge::open(&settings.port_name, settings.baud_rate) {
        Ok(mut bridge) => {
            bridge.send_button_delay(settings.button_delay_ms);
            bridge
        }
        Err(e) => {
            warn!("running without button console: {}", e);
            ConsoleBridge::disconnected()
        }
    };

    show_mouse(false);

    let mut cache = TextureCache::new();
    let mut controller = ExhibitController::new(settings, bridge);

    loop {
        let frame = poll_frame_input();
        controller.update(frame, get_frame_time());
        controller.draw(&mut cache);

        // Operator exit.
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        next_frame().await;
    }

    controller.shutdown();
}
