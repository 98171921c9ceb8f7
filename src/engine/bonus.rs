//! Time bonus per cascade step.

/// Cap on seconds granted by a single step.
pub const MAX_TIME_BONUS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bonus {
    pub match_bonus: u32,
    pub chain_bonus: u32,
    /// `min(match_bonus + chain_bonus, MAX_TIME_BONUS)`.
    pub time_bonus: u32,
    pub messages: Vec<String>,
}

/// Groups of 5+ earn 2, groups of 4 earn 1; steps at `chain_depth >= chain_bonus_from`
/// earn one more for the chain.
pub fn calculate(largest_group_size: usize, chain_depth: usize, chain_bonus_from: usize) -> Bonus {
    let match_bonus = match largest_group_size {
        n if n >= 5 => 2,
        4 => 1,
        _ => 0,
    };
    let chain_bonus = u32::from(chain_depth >= chain_bonus_from);
    let time_bonus = (match_bonus + chain_bonus).min(MAX_TIME_BONUS);

    let mut messages = Vec::new();
    if largest_group_size >= 4 {
        messages.push(format!("💥 {largest_group_size}-match bonus!"));
    }
    if chain_bonus > 0 {
        messages.push("⛓️ Chain clear bonus!".to_string());
    }
    if time_bonus > 0 {
        messages.push(format!("⏱️ +{time_bonus}s time bonus!"));
    }
    Bonus {
        match_bonus,
        chain_bonus,
        time_bonus,
        messages,
    }
}
