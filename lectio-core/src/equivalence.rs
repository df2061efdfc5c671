//! Decides whether a stored event already reflects a module.
//!
//! Only start, end, status and room take part in the comparison. Title,
//! teacher and homework edits never trigger an update on their own.

use crate::calendar_event::CalendarEvent;
use crate::module::Module;

pub fn is_equivalent(module: &Module, event: &CalendarEvent) -> bool {
    event.start == Some(module.start)
        && event.end == Some(module.end)
        && event.color.status() == module.status
        && event.room == module.room
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar_event::ColorMarker;
    use crate::module::ModuleStatus;
    use crate::module::tests::make_test_module;
    use crate::namespace::Namespace;
    use chrono::{Duration, FixedOffset};

    fn projected(module: &Module) -> CalendarEvent {
        CalendarEvent::from_module(module, &Namespace::default())
    }

    #[test]
    fn test_projection_is_equivalent() {
        let module = make_test_module("42");
        assert!(is_equivalent(&module, &projected(&module)));
    }

    #[test]
    fn test_time_shift_is_not_equivalent() {
        let module = make_test_module("42");
        let mut event = projected(&module);
        event.start = Some(module.start + Duration::minutes(5));
        assert!(!is_equivalent(&module, &event));

        let mut event = projected(&module);
        event.end = Some(module.end + Duration::minutes(5));
        assert!(!is_equivalent(&module, &event));
    }

    #[test]
    fn test_same_instant_in_other_offset_is_equivalent() {
        let module = make_test_module("42");
        let mut event = projected(&module);
        let utc = FixedOffset::east_opt(0).unwrap();
        event.start = Some(module.start.with_timezone(&utc));
        event.end = Some(module.end.with_timezone(&utc));
        assert!(is_equivalent(&module, &event));
    }

    #[test]
    fn test_room_change_is_not_equivalent() {
        let module = make_test_module("42");
        let mut event = projected(&module);
        event.room = "23".to_string();
        assert!(!is_equivalent(&module, &event));
    }

    #[test]
    fn test_status_change_is_not_equivalent() {
        let module = make_test_module("42");
        let mut event = projected(&module);
        event.color = ColorMarker::Red;
        assert!(!is_equivalent(&module, &event));

        let mut changed = module.clone();
        changed.status = ModuleStatus::Changed;
        assert!(!is_equivalent(&changed, &projected(&module)));
    }

    #[test]
    fn test_text_fields_are_ignored() {
        let module = make_test_module("42");
        let mut event = projected(&module);
        event.title = "Renamed".to_string();
        event.description = "Lærer: XYZ\n\nLektier:\nEverything".to_string();
        assert!(is_equivalent(&module, &event));
    }

    #[test]
    fn test_missing_times_are_not_equivalent() {
        let module = make_test_module("42");
        let mut event = projected(&module);
        event.start = None;
        event.end = None;
        assert!(!is_equivalent(&module, &event));
    }

    #[test]
    fn test_recoloured_unchanged_event_is_equivalent() {
        let module = make_test_module("42");
        let mut event = projected(&module);
        event.color = ColorMarker::Other("9".to_string());
        assert!(is_equivalent(&module, &event));
    }
}
