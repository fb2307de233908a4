use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackData {
    pub run_id: String,
    pub session_id: String,
    pub score: f64,
    #[serde(default)]
    pub comment: String,
}

impl FeedbackData {
    pub fn new<R: Into<String>, S: Into<String>>(
        run_id: R,
        session_id: S,
        score: FeedbackScore,
        comment: Option<String>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            session_id: session_id.into(),
            score: score.value(),
            comment: comment.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackScore {
    Helpful,
    NotHelpful,
}

impl FeedbackScore {
    pub fn value(self) -> f64 {
        match self {
            FeedbackScore::Helpful => 1.0,
            FeedbackScore::NotHelpful => 0.0,
        }
    }
}

impl std::str::FromStr for FeedbackScore {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" | "helpful" | "yes" | "+" => Ok(FeedbackScore::Helpful),
            "down" | "not-helpful" | "no" | "-" => Ok(FeedbackScore::NotHelpful),
            other => Err(format!("unknown feedback score: {}", other)),
        }
    }
}
