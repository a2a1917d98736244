use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{sync::Mutex, task::JoinHandle};
use tracing::debug;

use crate::surface::UiSurface;

pub const DEFAULT_TICK: Duration = Duration::from_millis(20);

/// Successive prefixes of `text`, one more character each.
pub fn frames(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.char_indices()
        .map(move |(idx, ch)| &text[..idx + ch.len_utf8()])
}

/// Renders text into the chat region one character per tick. Starting a new
/// animation resets the region and replaces the one in progress.
pub struct TypeWriter {
    surface: Arc<dyn UiSurface>,
    tick: Duration,
    generation: Arc<AtomicU64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TypeWriter {
    pub fn new(surface: Arc<dyn UiSurface>, tick: Duration) -> Self {
        Self {
            surface,
            tick,
            generation: Arc::new(AtomicU64::new(0)),
            task: Mutex::new(None),
        }
    }

    pub async fn start(&self, text: &str) {
        let mut task = self.task.lock().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = task.take() {
            previous.abort();
        }

        self.surface.set_chat_output("");
        debug!(chars = text.chars().count(), "typewriter: started");

        let surface = Arc::clone(&self.surface);
        let current = Arc::clone(&self.generation);
        let tick = self.tick;
        let text = text.to_owned();
        *task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            // the first tick of an interval completes immediately
            interval.tick().await;
            for frame in frames(&text) {
                interval.tick().await;
                if current.load(Ordering::SeqCst) != generation {
                    return;
                }
                surface.set_chat_output(frame);
            }
        }));
    }

    /// Waits for the running animation, if any, to finish.
    pub async fn wait(&self) {
        let handle = self.task.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingSurface;

    #[test]
    fn frames_grow_one_character_at_a_time() {
        assert_eq!(frames("ok").collect::<Vec<_>>(), vec!["o", "ok"]);
        assert_eq!(frames("né").collect::<Vec<_>>(), vec!["n", "né"]);
        assert_eq!(frames("").count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn writes_one_frame_per_tick_then_stops() {
        let surface = RecordingSurface::new();
        let writer = TypeWriter::new(surface.clone(), DEFAULT_TICK);

        writer.start("ok").await;
        tokio::time::sleep(DEFAULT_TICK + DEFAULT_TICK / 2).await;
        assert_eq!(surface.log().chat_frames, vec!["", "o"]);

        writer.wait().await;
        tokio::time::sleep(DEFAULT_TICK * 10).await;
        assert_eq!(surface.log().chat_frames, vec!["", "o", "ok"]);
    }

    #[tokio::test(start_paused = true)]
    async fn new_animation_resets_and_replaces_running_one() {
        let surface = RecordingSurface::new();
        let writer = TypeWriter::new(surface.clone(), DEFAULT_TICK);

        writer.start("abcdef").await;
        tokio::time::sleep(DEFAULT_TICK * 2 + DEFAULT_TICK / 2).await;
        writer.start("xy").await;
        writer.wait().await;
        tokio::time::sleep(DEFAULT_TICK * 10).await;

        assert_eq!(
            surface.log().chat_frames,
            vec!["", "a", "ab", "", "x", "xy"]
        );
    }
}
