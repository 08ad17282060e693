//! Spinner frames for cards that are still detecting.

const FRAMES: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Frames advanced per spinner step.
const TICKS_PER_FRAME: u64 = 6;

pub(crate) struct AnimationState {
    pub tick: u64,
}

impl AnimationState {
    pub fn new() -> Self {
        Self { tick: 0 }
    }

    pub fn advance(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn spinner_char(&self) -> char {
        FRAMES[((self.tick / TICKS_PER_FRAME) % FRAMES.len() as u64) as usize]
    }
}
