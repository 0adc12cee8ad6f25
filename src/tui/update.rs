//! Update function for the burst screen
//!
//! Applies one [`Msg`] to the controller and reports what the loop has to do
//! next. No terminal I/O happens here.

use super::msg::Msg;
use crate::burst::{Clock, Cue};
use crate::error::Result;
use crate::model::PracticeLog;
use crate::store::PracticeStore;
use crate::PracticeApp;

/// What the event loop should do after an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// The countdown ran out: ring the bell
    Bell,
    /// The burst was recorded; leave the screen
    Logged(PracticeLog),
    /// The burst was discarded; leave the screen
    Closed,
}

pub fn update<S: PracticeStore, C: Clock>(app: &mut PracticeApp<S, C>, msg: Msg) -> Result<Effect> {
    match msg {
        Msg::Tick => {
            // Haptic has no terminal counterpart
            if app.tick().contains(&Cue::Tone) {
                Ok(Effect::Bell)
            } else {
                Ok(Effect::None)
            }
        }
        Msg::Start => app.start_timer().map(|_| Effect::None),
        Msg::Stop => app.stop_timer().map(|_| Effect::None),
        Msg::BpmUp => app.adjust_runtime_bpm(1).map(|_| Effect::None),
        Msg::BpmDown => app.adjust_runtime_bpm(-1).map(|_| Effect::None),
        Msg::Done => app.complete_burst().map(Effect::Logged),
        Msg::Close => {
            app.close_burst();
            Ok(Effect::Closed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ItemForm;
    use crate::burst::{BurstPhase, ManualClock};
    use crate::config::{Config, StorageConfig};
    use crate::model::LogFilter;
    use crate::store::{LocalStore, MemorySlots};
    use chrono::{TimeZone, Utc};

    fn app_with_riff() -> (PracticeApp<LocalStore<MemorySlots>, ManualClock>, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 5, 18, 0, 0).unwrap());
        let config = Config {
            storage: StorageConfig {
                seed_on_empty: false,
                ..StorageConfig::default()
            },
            ..Config::default()
        };
        let mut app = PracticeApp::with_clock(LocalStore::new(MemorySlots::new()), clock.clone(), config);
        app.init().unwrap();
        let riff = app
            .save_item(ItemForm {
                title: "Ladies Night".to_string(),
                kind: "riff".to_string(),
                allow_burst: true,
                ..ItemForm::default()
            })
            .unwrap();
        app.start_burst_on_item(&riff.id).unwrap();
        (app, clock)
    }

    #[test]
    fn test_full_burst_rings_once_then_logs() {
        let (mut app, clock) = app_with_riff();
        assert_eq!(update(&mut app, Msg::Start).unwrap(), Effect::None);
        update(&mut app, Msg::BpmUp).unwrap();
        update(&mut app, Msg::BpmUp).unwrap();
        update(&mut app, Msg::BpmDown).unwrap();

        clock.advance_secs(299);
        assert_eq!(update(&mut app, Msg::Tick).unwrap(), Effect::None);
        clock.advance_secs(1);
        assert_eq!(update(&mut app, Msg::Tick).unwrap(), Effect::Bell);
        assert_eq!(update(&mut app, Msg::Tick).unwrap(), Effect::None);

        match update(&mut app, Msg::Done).unwrap() {
            Effect::Logged(log) => {
                assert_eq!(log.minutes, 5);
                assert_eq!(log.values.bpm, Some(101));
            }
            other => panic!("expected a log, got {:?}", other),
        }
        assert!(app.burst().is_none());
    }

    #[test]
    fn test_stop_then_close_discards() {
        let (mut app, clock) = app_with_riff();
        update(&mut app, Msg::Start).unwrap();
        clock.advance_secs(30);
        update(&mut app, Msg::Stop).unwrap();
        assert_eq!(app.burst().map(|b| b.phase()), Some(BurstPhase::Finished));

        assert_eq!(update(&mut app, Msg::Close).unwrap(), Effect::Closed);
        assert!(app.logs(&LogFilter::all()).unwrap().is_empty());
        assert_eq!(update(&mut app, Msg::Tick).unwrap(), Effect::None);
    }

    #[test]
    fn test_stop_before_start_is_user_error() {
        let (mut app, _clock) = app_with_riff();
        let err = update(&mut app, Msg::Stop).unwrap_err();
        assert!(err.is_user_error());
    }
}
