//! Coin rewards, correct-answer counting and the leaderboard.

use serde::{Deserialize, Serialize};

use crate::types::{LeaderboardEntry, User};

/// Coins for one correct grading or quiz answer.
pub const REWARD_COINS: u64 = 10;

/// Increment applied to a user after an answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub coins: u64,
    pub correct: u64,
}

impl Reward {
    pub const NONE: Reward = Reward {
        coins: 0,
        correct: 0,
    };

    pub const CORRECT: Reward = Reward {
        coins: REWARD_COINS,
        correct: 1,
    };

    /// Reward for an "easy" grading or a correct quiz answer; nothing otherwise.
    pub fn for_answer(correct: bool) -> Self {
        if correct {
            Self::CORRECT
        } else {
            Self::NONE
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

/// Add a reward to a user. Touches only `coins` and `correct`.
pub fn apply_reward(user: &mut User, reward: Reward) {
    user.coins = user.coins.saturating_add(reward.coins);
    user.correct = user.correct.saturating_add(reward.correct);
}

/// Add elapsed study time. Never decreases the total.
pub fn add_study_time(user: &mut User, elapsed_ms: u64) {
    user.time_ms = user.time_ms.saturating_add(elapsed_ms);
}

/// Users ranked by coins, highest first; ties keep their input order.
pub fn leaderboard(users: &[User]) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<&User> = users.iter().collect();
    ranked.sort_by(|a, b| b.coins.cmp(&a.coins));

    ranked
        .into_iter()
        .enumerate()
        .map(|(i, u)| LeaderboardEntry {
            rank: i + 1,
            user_id: u.id,
            name: u.name.clone(),
            coins: u.coins,
            correct: u.correct,
            study_minutes: u.study_minutes(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn user(name: &str, coins: u64) -> User {
        let mut u = User::new(name, &format!("{name}@example.com"), Role::Student, Utc::now());
        u.coins = coins;
        u
    }

    #[test]
    fn correct_answer_adds_ten_coins_and_one_correct() {
        let mut u = user("ada", 20);
        u.time_ms = 5_000;
        let before = u.clone();

        apply_reward(&mut u, Reward::for_answer(true));

        assert_eq!(u.coins, before.coins + 10);
        assert_eq!(u.correct, before.correct + 1);
        assert_eq!(
            User {
                coins: before.coins,
                correct: before.correct,
                ..u.clone()
            },
            before
        );
    }

    #[test]
    fn wrong_answer_changes_nothing() {
        let mut u = user("ada", 20);
        let before = u.clone();
        apply_reward(&mut u, Reward::for_answer(false));
        assert_eq!(u, before);
        assert!(Reward::for_answer(false).is_empty());
    }

    #[test]
    fn study_time_is_additive() {
        let mut u = user("ada", 0);
        add_study_time(&mut u, 1_000);
        add_study_time(&mut u, 250);
        assert_eq!(u.time_ms, 1_250);
    }

    #[test]
    fn leaderboard_orders_by_coins_stably() {
        let users = vec![user("a", 10), user("b", 30), user("c", 10), user("d", 0)];
        let board = leaderboard(&users);

        let names: Vec<&str> = board.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c", "d"]);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[3].rank, 4);
    }
}
