//! Roster fixtures

use lineup_core::{GbsNumber, Gender, LineupRecord, MemoId, RecordId};

/// A registered participant with nothing assigned yet
pub fn participant(id: i64, name: &str, gender: Gender) -> LineupRecord {
    LineupRecord {
        id: RecordId::new(id),
        name: name.to_string(),
        gender,
        department: None,
        phone: None,
        gbs_number: None,
        is_leader: false,
        memo: None,
        memo_id: None,
        memo_color: None,
        group_male_count: 0,
        group_female_count: 0,
        is_full_attendance: false,
    }
}

/// A group leader; the server manages their assignment
pub fn leader(id: i64, name: &str, gender: Gender, gbs: u32) -> LineupRecord {
    let mut record = participant(id, name, gender);
    record.is_leader = true;
    record.gbs_number = Some(GbsNumber::new(gbs).expect("fixture gbs"));
    record
}

/// A participant with an existing memo
pub fn with_memo(id: i64, name: &str, gender: Gender, memo: &str, memo_id: i64) -> LineupRecord {
    let mut record = participant(id, name, gender);
    record.memo = Some(memo.to_string());
    record.memo_id = Some(MemoId::new(memo_id));
    record
}

/// Six-person roster: two leaders, four unassigned participants
pub fn sample_roster() -> Vec<LineupRecord> {
    vec![
        leader(1, "Kim Minji", Gender::Female, 1),
        leader(2, "Park Junho", Gender::Male, 2),
        participant(42, "Lee Seoyeon", Gender::Female),
        participant(43, "Choi Hyunwoo", Gender::Male),
        participant(44, "Jung Yuna", Gender::Female),
        with_memo(45, "Han Jisoo", Gender::Female, "vegetarian meals", 500),
    ]
}
