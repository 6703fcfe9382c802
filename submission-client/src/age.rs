//! Selectable ages and the developmental stage each falls in.

/// Oldest selectable age.
pub const MAX_AGE_MONTHS: u32 = 36;

/// Age preselected when the wizard starts.
pub const DEFAULT_AGE_MONTHS: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeStage {
    SensoryExploration,
    Crawling,
    Toddling,
    Imitation,
    LanguageBurst,
    IndependentPlay,
}

impl AgeStage {
    pub fn for_months(months: u32) -> Self {
        match months {
            0..=6 => AgeStage::SensoryExploration,
            7..=12 => AgeStage::Crawling,
            13..=18 => AgeStage::Toddling,
            19..=24 => AgeStage::Imitation,
            25..=30 => AgeStage::LanguageBurst,
            _ => AgeStage::IndependentPlay,
        }
    }

    pub fn label_zh(&self) -> &'static str {
        match self {
            AgeStage::SensoryExploration => "感官探索期",
            AgeStage::Crawling => "爬行探索期",
            AgeStage::Toddling => "学步期",
            AgeStage::Imitation => "模仿学习期",
            AgeStage::LanguageBurst => "语言爆发期",
            AgeStage::IndependentPlay => "独立游戏期",
        }
    }

    pub fn label_en(&self) -> &'static str {
        match self {
            AgeStage::SensoryExploration => "Sensory exploration",
            AgeStage::Crawling => "Crawling and exploring",
            AgeStage::Toddling => "Toddling",
            AgeStage::Imitation => "Learning by imitation",
            AgeStage::LanguageBurst => "Language burst",
            AgeStage::IndependentPlay => "Independent play",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            AgeStage::SensoryExploration => "👶",
            AgeStage::Crawling => "🍼",
            AgeStage::Toddling => "👣",
            AgeStage::Imitation => "🎈",
            AgeStage::LanguageBurst => "💬",
            AgeStage::IndependentPlay => "🎨",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeOption {
    pub months: u32,
    pub label: String,
    pub stage: AgeStage,
}

/// One option per month from 0 to [`MAX_AGE_MONTHS`].
pub fn age_options() -> Vec<AgeOption> {
    (0..=MAX_AGE_MONTHS)
        .map(|months| AgeOption {
            months,
            label: format!("{}个月", months),
            stage: AgeStage::for_months(months),
        })
        .collect()
}
