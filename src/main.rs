mod cli;
mod ui;

use std::sync::{Arc, Mutex};

use clap::Parser;
use winit::event_loop::EventLoop;

use folio::view::ViewController;

use crate::cli::Cli;
use crate::ui::state::ViewerState;
use crate::ui::{App, UserEvent};

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.to_config();

    let mut view = match ViewController::new(&config) {
        Ok(view) => view,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(2);
        }
    };

    let event_loop = EventLoop::<UserEvent>::with_user_event()
        .build()
        .expect("create event loop");
    let proxy = Mutex::new(event_loop.create_proxy());

    // The prefetch thread only pokes the loop; the report is handled on the
    // UI thread.
    view.set_prefetch_waker(Arc::new(move || {
        if let Ok(proxy) = proxy.lock() {
            let _ = proxy.send_event(UserEvent::PrefetchFinished);
        }
    }));

    view.open(&cli.paths);
    if view.playlist().is_empty() && !cli.paths.is_empty() {
        log::warn!("No readable images found.");
    }
    if cli.slideshow {
        view.start_slideshow();
    }

    let mut app = App::new(ViewerState::new(view));
    event_loop.run_app(&mut app).expect("run event loop");
}
