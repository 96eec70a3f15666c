use super::*;

#[derive(Debug)]
pub struct ChoiceExtractor {
    turn_to: Regex,
    max_section: u32,
}

impl ChoiceExtractor {
    pub fn new(max_section: u32) -> Result<Self> {
        Ok(Self {
            turn_to: Regex::new(r"(?i)turn\s+to\s+(\d+)")
                .context("failed to compile turn-to regex")?,
            max_section,
        })
    }

    /// One choice per "turn to N" phrase, in reading order. The dice flag
    /// covers the whole body, not the individual phrase.
    pub fn extract(&self, text: &str) -> Vec<Choice> {
        let is_dice_roll = mentions_dice(text);

        self.turn_to
            .captures_iter(text)
            .filter_map(|captures| captures.get(1)?.as_str().parse::<u32>().ok())
            .filter(|target| (1..=self.max_section).contains(target))
            .map(|target| Choice {
                target_section_number: target,
                description: format!("Turn to {target}"),
                is_dice_roll,
            })
            .collect()
    }
}

fn mentions_dice(text: &str) -> bool {
    let lowered = text.to_lowercase();
    lowered.contains("roll") || lowered.contains("dice")
}
