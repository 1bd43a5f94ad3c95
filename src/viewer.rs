//! The viewer's frame loop: drain input, poll the network, draw, then sleep
//! the remainder of a 60 Hz tick. Single-threaded; the model is only
//! mutated between the socket read and the draw of the same frame.

use std::time::{Duration, Instant};

use anyhow::Result;

use crate::model::Game;
use crate::render::{self, draw_frame, Renderer, Ui, HEADER_FONT_SIZE};
use crate::server::NetworkState;
use crate::telemetry;

const FRAME_PERIOD: Duration = Duration::from_millis(1000 / 60);

pub struct Viewer<R: Renderer> {
    renderer: R,
    net: NetworkState,
    game: Game,
    ui: Ui,
    started: Instant,
}

impl<R: Renderer> Viewer<R> {
    pub fn new(renderer: R, net: NetworkState) -> Self {
        Self {
            renderer,
            net,
            game: Game::default(),
            ui: Ui::new(),
            started: Instant::now(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            let frame_start = Instant::now();
            let perf = telemetry::PerfGuard::new("viewer.frame");

            self.ui.sync_selected_run(&self.game);

            let (window_w, _) = self.renderer.window_size();
            let (_, header_cell_h) = self.renderer.cell_size(HEADER_FONT_SIZE);
            let header_h = render::header_height(header_cell_h);
            while let Some(event) = self.renderer.poll_input()? {
                if !self
                    .ui
                    .handle_event(&mut self.game, window_w, header_h, event)
                {
                    return Ok(());
                }
            }

            self.net.poll(&mut self.game);

            let elapsed_ms = self.started.elapsed().as_millis() as u64;
            draw_frame(&mut self.renderer, &self.game, &mut self.ui, elapsed_ms)?;

            drop(perf);
            if let Some(remaining) = FRAME_PERIOD.checked_sub(frame_start.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
    }
}
