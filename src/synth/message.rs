use rtrb::Consumer;

/// One committed voice decision, sent from the control thread to the renderer.
///
/// Every command carries the lifecycle `epoch` it was issued in. The renderer
/// drops commands from an older epoch and hard-resets its voices when it
/// sees a newer one.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VoiceCommand {
    /// Bind `slot` to `note` and (re)enter the attack.
    Start {
        slot: usize,
        note: u8,
        generation: u32,
        epoch: u32,
    },
    /// Release the voice in `slot` if it still plays `generation`.
    Release {
        slot: usize,
        generation: u32,
        epoch: u32,
    },
    /// Release every sounding voice; `fast` uses the short panic release.
    ReleaseAll { fast: bool, epoch: u32 },
}

impl VoiceCommand {
    pub fn epoch(&self) -> u32 {
        match *self {
            VoiceCommand::Start { epoch, .. }
            | VoiceCommand::Release { epoch, .. }
            | VoiceCommand::ReleaseAll { epoch, .. } => epoch,
        }
    }
}

pub trait CommandReceiver: Send {
    fn pop(&mut self) -> Option<VoiceCommand>;
}

impl CommandReceiver for Consumer<VoiceCommand> {
    fn pop(&mut self) -> Option<VoiceCommand> {
        Consumer::pop(self).ok()
    }
}
