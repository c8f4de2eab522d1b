pub mod mock_capture;
pub mod mock_launcher;
pub mod mock_model;
pub mod mock_tts;

use mock_launcher::MockLauncher;
use mock_model::MockModel;
use mock_tts::MockTtsFactory;
use voicebot::controller::TurnController;
use voicebot::dialogue::DialogueSession;
use voicebot::launcher::OsFamily;
use voicebot::tts::{SpeechOutput, VoicePrefs};

pub const PERSONA: &str = "You are a test persona.";

/// Controller wired to mocks, plus handles to inspect them
pub struct TestContext {
    pub controller: TurnController,
    pub tts: MockTtsFactory,
    pub launcher: MockLauncher,
    pub model: MockModel,
}

impl TestContext {
    pub fn new(os: OsFamily) -> Self {
        Self::with_parts(os, MockTtsFactory::new(), MockModel::new())
    }

    pub fn with_parts(os: OsFamily, tts: MockTtsFactory, model: MockModel) -> Self {
        let launcher = MockLauncher::new();
        let output = SpeechOutput::new(Box::new(tts.clone()), VoicePrefs::default())
            .expect("Failed to create speech output");
        let session = DialogueSession::start(Box::new(model.clone()), PERSONA);
        let controller = TurnController::new(session, output, Box::new(launcher.clone()), os);

        Self {
            controller,
            tts,
            launcher,
            model,
        }
    }
}
