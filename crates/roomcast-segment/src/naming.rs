//! Deterministic segment file naming.

use chrono::NaiveDateTime;

/// Replace characters that are awkward in file names with underscores.
fn sanitize(component: &str) -> String {
    component
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | ':' => '_',
            other => other,
        })
        .collect()
}

/// Build the file name for one segment of a session.
///
/// The name is `{room}_{user}_{YYYYmmdd_HHMMSS}_part{N}.mp4`, where the
/// timestamp is the session start time. Two sessions started in the same
/// second by different users, or in different rooms, still produce distinct
/// names; within one session the part number keeps names distinct.
pub fn segment_file_name(room: &str, username: &str, started: NaiveDateTime, part: u32) -> String {
    format!(
        "{}_{}_{}_part{}.mp4",
        sanitize(room),
        sanitize(username),
        started.format("%Y%m%d_%H%M%S"),
        part
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn name_includes_room_user_timestamp_and_part() {
        let name = segment_file_name("standup", "alice", at(9, 30, 5), 1);
        assert_eq!(name, "standup_alice_20240315_093005_part1.mp4");
    }

    #[test]
    fn same_second_different_users_do_not_collide() {
        let t = at(9, 30, 5);
        let a = segment_file_name("standup", "alice", t, 1);
        let b = segment_file_name("standup", "bob", t, 1);
        assert_ne!(a, b);
    }

    #[test]
    fn same_second_different_rooms_do_not_collide() {
        let t = at(9, 30, 5);
        let a = segment_file_name("standup", "alice", t, 1);
        let b = segment_file_name("retro", "alice", t, 1);
        assert_ne!(a, b);
    }

    #[test]
    fn parts_of_one_session_do_not_collide() {
        let t = at(9, 30, 5);
        let a = segment_file_name("standup", "alice", t, 1);
        let b = segment_file_name("standup", "alice", t, 2);
        assert_ne!(a, b);
    }

    #[test]
    fn spaces_and_separators_are_sanitized() {
        let name = segment_file_name("daily sync", "a/b", at(0, 0, 0), 3);
        assert_eq!(name, "daily_sync_a_b_20240315_000000_part3.mp4");
    }
}
