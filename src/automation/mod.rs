mod engine;
mod injector;
mod player;
mod recorder;
mod types;


pub use engine::MacroEngine;
pub use injector::{InputInjector, RecordingInjector, TracingInjector};
pub use player::{MacroPlayer, PlaybackHandle};
pub use recorder::MacroRecorder;
pub use types::{MacroEvent, MacroState, MacroTimeline, PlaybackOutcome, PointerKind, PointerSample};
