use std::ops::RangeInclusive;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;

use crate::models::ResponseType;

/// Answer style selected in the test console.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Only answers that cite a reference document; slower.
    Detailed,
    /// Answers at the low end of the delay range.
    Fast,
    #[default]
    Mixed,
}

impl ResponseMode {
    /// Accepts the API names and the console's Korean labels.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "detailed" | "더 자세하게" => Some(ResponseMode::Detailed),
            "fast" | "더 빠르게" => Some(ResponseMode::Fast),
            "mixed" | "혼합" => Some(ResponseMode::Mixed),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ResponseMode::Detailed => "detailed",
            ResponseMode::Fast => "fast",
            ResponseMode::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CannedResponse {
    pub content: &'static str,
    pub response_type: ResponseType,
    pub references: &'static [&'static str],
}

pub const CANNED_RESPONSES: [CannedResponse; 3] = [
    CannedResponse {
        content: "연차는 사내 포털의 전자결재 시스템에서 \"휴가신청\" 메뉴를 선택하여 신청할 수 있습니다.",
        response_type: ResponseType::Faq,
        references: &["직원 복지 가이드.pdf"],
    },
    CannedResponse {
        content: "ROI(Return on Investment)는 투자 대비 수익률을 의미하며, 투자로 인한 이익을 투자 비용으로 나눈 값입니다.",
        response_type: ResponseType::TermDefinition,
        references: &["용어 사전.pdf"],
    },
    CannedResponse {
        content: "좋은 하루 보내세요! 더 궁금하신 것이 있으시면 언제든지 물어보세요.",
        response_type: ResponseType::SmallTalk,
        references: &[],
    },
];

/// Decides which canned response the console answers with, and when.
pub trait ResponsePicker: Send + Sync + 'static {
    /// Index into `candidates`. Out-of-range values are clamped by the caller.
    fn pick(&self, mode: ResponseMode, candidates: &[CannedResponse]) -> usize;

    /// How long the console stays in `AwaitingResponse`.
    fn delay(&self, mode: ResponseMode) -> Duration;

    /// Response time in seconds reported alongside the reply.
    fn response_time(&self, mode: ResponseMode) -> f64;
}

pub struct RandomPicker {
    delay_ms: RangeInclusive<u64>,
}

impl RandomPicker {
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        let min = min_delay.as_millis() as u64;
        let max = (max_delay.as_millis() as u64).max(min);
        Self {
            delay_ms: min..=max,
        }
    }
}

impl Default for RandomPicker {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), Duration::from_millis(2000))
    }
}

impl ResponsePicker for RandomPicker {
    fn pick(&self, mode: ResponseMode, candidates: &[CannedResponse]) -> usize {
        let mut rng = rand::thread_rng();
        if mode == ResponseMode::Detailed {
            let referenced: Vec<usize> = candidates
                .iter()
                .enumerate()
                .filter(|(_, response)| !response.references.is_empty())
                .map(|(index, _)| index)
                .collect();
            if !referenced.is_empty() {
                return referenced[rng.gen_range(0..referenced.len())];
            }
        }
        if candidates.is_empty() {
            return 0;
        }
        rng.gen_range(0..candidates.len())
    }

    fn delay(&self, mode: ResponseMode) -> Duration {
        let (min, max) = (*self.delay_ms.start(), *self.delay_ms.end());
        let millis = match mode {
            ResponseMode::Fast => min,
            ResponseMode::Detailed => rand::thread_rng().gen_range(min + (max - min) / 2..=max),
            ResponseMode::Mixed => rand::thread_rng().gen_range(min..=max),
        };
        Duration::from_millis(millis)
    }

    fn response_time(&self, mode: ResponseMode) -> f64 {
        let mut rng = rand::thread_rng();
        match mode {
            ResponseMode::Fast => rng.gen_range(0.5..1.0),
            ResponseMode::Detailed => rng.gen_range(1.5..2.5),
            ResponseMode::Mixed => rng.gen_range(0.5..2.5),
        }
    }
}
