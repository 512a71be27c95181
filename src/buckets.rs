use crate::models::{Attendance, AttendanceStatus, Poll, PollVote, Profile};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Voter {
    pub user_id: Uuid,
    pub full_name: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct AttendanceBuckets {
    pub present: Vec<Voter>,
    pub absent: Vec<Voter>,
    pub maybe: Vec<Voter>,
    pub no_response: Vec<Voter>,
}

impl AttendanceBuckets {
    pub fn counts(&self) -> AttendanceCounts {
        AttendanceCounts {
            present: self.present.len(),
            absent: self.absent.len(),
            maybe: self.maybe.len(),
            no_response: self.no_response.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct AttendanceCounts {
    pub present: usize,
    pub absent: usize,
    pub maybe: usize,
    pub no_response: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionTally {
    pub index: usize,
    pub label: String,
    pub count: usize,
    pub percent: u32,
    pub voters: Vec<Voter>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollTally {
    pub total_votes: usize,
    pub options: Vec<OptionTally>,
    pub no_response: Vec<Voter>,
}

/// Splits one event's attendance rows into display buckets. Every profile
/// without a status lands in `no_response`.
pub fn bucket_attendance(
    event_id: Uuid,
    attendance: &[Attendance],
    profiles: &[Profile],
) -> AttendanceBuckets {
    let mut buckets = AttendanceBuckets::default();
    let mut responded = HashSet::new();

    for row in attendance.iter().filter(|row| row.event_id == event_id) {
        let Some(status) = row.status else {
            continue;
        };
        let Some(profile) = profiles.iter().find(|profile| profile.id == row.user_id) else {
            continue;
        };
        if !responded.insert(row.user_id) {
            continue;
        }

        let voter = Voter {
            user_id: profile.id,
            full_name: profile.full_name.clone(),
            reason: row.reason.clone(),
        };
        match status {
            AttendanceStatus::In => buckets.present.push(voter),
            AttendanceStatus::Out => buckets.absent.push(voter),
            AttendanceStatus::Maybe => buckets.maybe.push(voter),
        }
    }

    buckets.no_response = missing_voters(profiles, &responded);

    sort_by_name(&mut buckets.present);
    sort_by_name(&mut buckets.absent);
    sort_by_name(&mut buckets.maybe);
    buckets
}

pub fn tally_poll(poll: &Poll, votes: &[PollVote], profiles: &[Profile]) -> PollTally {
    let mut voted = HashSet::new();
    let mut options: Vec<OptionTally> = poll
        .options
        .iter()
        .enumerate()
        .map(|(index, label)| OptionTally {
            index,
            label: label.clone(),
            count: 0,
            percent: 0,
            voters: Vec::new(),
        })
        .collect();

    for vote in votes.iter().filter(|vote| vote.poll_id == poll.id) {
        let Some(option) = options.get_mut(vote.option_index) else {
            continue;
        };
        if !voted.insert(vote.user_id) {
            continue;
        }
        option.count += 1;
        if let Some(profile) = profiles.iter().find(|profile| profile.id == vote.user_id) {
            option.voters.push(Voter {
                user_id: profile.id,
                full_name: profile.full_name.clone(),
                reason: None,
            });
        }
    }

    let total_votes = voted.len();
    for option in &mut options {
        option.percent = percent(option.count, total_votes);
        sort_by_name(&mut option.voters);
    }

    PollTally {
        total_votes,
        options,
        no_response: missing_voters(profiles, &voted),
    }
}

/// Share of `total` as a whole percentage, rounded half up.
pub fn percent(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (count as f64 / total as f64 * 100.0).round() as u32
}

pub fn status_of(attendance: &[Attendance], event_id: Uuid, user_id: Uuid) -> Option<&Attendance> {
    attendance
        .iter()
        .find(|row| row.event_id == event_id && row.user_id == user_id)
}

pub fn vote_of(votes: &[PollVote], poll_id: Uuid, user_id: Uuid) -> Option<usize> {
    votes
        .iter()
        .find(|vote| vote.poll_id == poll_id && vote.user_id == user_id)
        .map(|vote| vote.option_index)
}

fn missing_voters(profiles: &[Profile], responded: &HashSet<Uuid>) -> Vec<Voter> {
    let mut missing: Vec<Voter> = profiles
        .iter()
        .filter(|profile| !responded.contains(&profile.id))
        .map(|profile| Voter {
            user_id: profile.id,
            full_name: profile.full_name.clone(),
            reason: None,
        })
        .collect();
    sort_by_name(&mut missing);
    missing
}

fn sort_by_name(voters: &mut [Voter]) {
    voters.sort_by_cached_key(|voter| voter.full_name.to_lowercase());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Utc;

    fn profile(name: &str) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            role: Role::Member,
            created_at: Utc::now(),
        }
    }

    fn row(
        event_id: Uuid,
        user: &Profile,
        status: Option<AttendanceStatus>,
        reason: Option<&str>,
    ) -> Attendance {
        Attendance {
            event_id,
            user_id: user.id,
            status,
            reason: reason.map(str::to_string),
            updated_at: Utc::now(),
        }
    }

    fn vote(poll: &Poll, user: &Profile, option_index: usize) -> PollVote {
        PollVote {
            poll_id: poll.id,
            user_id: user.id,
            option_index,
            updated_at: Utc::now(),
        }
    }

    fn poll(options: &[&str]) -> Poll {
        Poll {
            id: Uuid::new_v4(),
            question: "Team dinner?".to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn attendance_is_bucketed_by_status() {
        let event_id = Uuid::new_v4();
        let other_event = Uuid::new_v4();
        let (anna, bram, cas, dirk, eva) =
            (profile("anna"), profile("Bram"), profile("Cas"), profile("Dirk"), profile("Eva"));
        let profiles = vec![eva.clone(), dirk.clone(), cas.clone(), bram.clone(), anna.clone()];
        let rows = vec![
            row(event_id, &bram, Some(AttendanceStatus::In), None),
            row(event_id, &anna, Some(AttendanceStatus::In), None),
            row(event_id, &cas, Some(AttendanceStatus::Out), Some("injured")),
            row(event_id, &dirk, None, None),
            row(other_event, &eva, Some(AttendanceStatus::Maybe), None),
        ];

        let buckets = bucket_attendance(event_id, &rows, &profiles);
        let names = |voters: &[Voter]| {
            voters
                .iter()
                .map(|v| v.full_name.clone())
                .collect::<Vec<_>>()
        };

        assert_eq!(names(&buckets.present), vec!["anna", "Bram"]);
        assert_eq!(names(&buckets.absent), vec!["Cas"]);
        assert_eq!(buckets.absent[0].reason.as_deref(), Some("injured"));
        assert!(buckets.maybe.is_empty());
        assert_eq!(names(&buckets.no_response), vec!["Dirk", "Eva"]);
        assert_eq!(
            buckets.counts(),
            AttendanceCounts { present: 2, absent: 1, maybe: 0, no_response: 2 }
        );
    }

    #[test]
    fn rows_without_profile_are_skipped() {
        let event_id = Uuid::new_v4();
        let ghost = profile("Ghost");
        let anna = profile("Anna");
        let rows = vec![row(event_id, &ghost, Some(AttendanceStatus::In), None)];

        let buckets = bucket_attendance(event_id, &rows, std::slice::from_ref(&anna));
        assert!(buckets.present.is_empty());
        assert_eq!(buckets.no_response.len(), 1);
    }

    #[test]
    fn poll_tally_computes_rounded_percentages() {
        let p = poll(&["Friday", "Saturday", "Sunday"]);
        let members: Vec<Profile> = ["A", "B", "C", "D"].iter().map(|n| profile(n)).collect();
        let votes = vec![
            vote(&p, &members[0], 0),
            vote(&p, &members[1], 0),
            vote(&p, &members[2], 1),
        ];

        let tally = tally_poll(&p, &votes, &members);
        assert_eq!(tally.total_votes, 3);
        assert_eq!(tally.options[0].count, 2);
        assert_eq!(tally.options[0].percent, 67);
        assert_eq!(tally.options[1].percent, 33);
        assert_eq!(tally.options[2].percent, 0);
        assert_eq!(tally.options[0].voters.len(), 2);
        assert_eq!(tally.no_response.len(), 1);
        assert_eq!(tally.no_response[0].full_name, "D");
    }

    #[test]
    fn empty_poll_has_zero_percentages() {
        let p = poll(&["Yes", "No"]);
        let tally = tally_poll(&p, &[], &[profile("A")]);
        assert_eq!(tally.total_votes, 0);
        assert!(tally.options.iter().all(|option| option.percent == 0));
    }

    #[test]
    fn out_of_range_votes_are_ignored() {
        let p = poll(&["Yes", "No"]);
        let a = profile("A");
        let tally = tally_poll(&p, &[vote(&p, &a, 5)], std::slice::from_ref(&a));
        assert_eq!(tally.total_votes, 0);
        assert_eq!(tally.no_response.len(), 1);
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(4, 4), 100);
    }
}
