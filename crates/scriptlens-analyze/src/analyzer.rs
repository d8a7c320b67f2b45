//! Script analysis intents built on a [`CompletionClient`].
//!
//! Every method cleans the script text first and trims long inputs to head,
//! middle and tail windows so a single request stays within model limits.
//! Calls are awaited one after another.

use tracing::{debug, info};

use crate::parse::{extract_mermaid, parse_structured, FALLBACK_TREE};
use crate::providers::CompletionClient;
use crate::types::{CompletionRequest, StructuredOutput, SummaryStrategy};
use scriptlens_core::{Error, Result};
use scriptlens_ingest::chunking::{clean_script_text, head_chars, sample_windows, tail_chars};

/// Scripts shorter than this (in chars) are not worth a completion call.
pub const MIN_ANALYSIS_CHARS: usize = 100;

/// Summaries of texts up to this length use a single call.
pub const SINGLE_CALL_MAX: usize = 6_000;
/// Summaries of texts up to this length use head/tail calls plus a synthesis.
pub const HEAD_TAIL_MAX: usize = 12_000;

/// Fixed question table for [`ScriptAnalyzer::ask`].
pub const QUESTIONS: &[&str] = &[
    "줄거리를 1천 자 이내로 요약해 줘.",
    "기, 승, 전, 결 각각의 핵심 내용을 3줄씩 bullet point로 정리해 줘.",
    "이 영화의 등장인물 수는 몇 명인가?",
    "주인공의 감정 변화를 기, 승, 전, 결 4단계로 요약해 줘.",
    "이 영화의 장르 구성 요소를 합이 100%가 되도록 분석해 줘. (예: 액션 40%, 드라마 30%, 스릴러 30%)",
    "유사한 주제를 가진 영화를 최대 5개 추천해 줘.",
    "이 영화의 흥행 요소를 500자 이내로 분석해 줘.",
];

/// Script text shown with each question.
pub const QUESTION_CONTEXT_CHARS: usize = 2_000;

const SCRIPT_ANALYST: &str = "당신은 영화/드라마 스크립트 분석 전문가입니다.";

/// Pick the summarization strategy for a cleaned text of `len` chars.
pub fn summary_strategy(len: usize) -> SummaryStrategy {
    if len <= SINGLE_CALL_MAX {
        SummaryStrategy::Single
    } else if len <= HEAD_TAIL_MAX {
        SummaryStrategy::HeadTail
    } else {
        SummaryStrategy::Sampled
    }
}

/// Head and tail of a text joined by an ellipsis line when it exceeds `limit` chars.
fn head_tail_excerpt(text: &str, limit: usize, window: usize) -> String {
    if text.chars().count() > limit {
        format!("{}\n\n...\n\n{}", head_chars(text, window), tail_chars(text, window))
    } else {
        text.to_string()
    }
}

/// Runs analysis intents against an injected completion client.
pub struct ScriptAnalyzer<'c, C: CompletionClient> {
    client: &'c C,
}

impl<'c, C: CompletionClient> ScriptAnalyzer<'c, C> {
    pub fn new(client: &'c C) -> Self {
        Self { client }
    }

    /// Summarize a script: characters, relationships, events, plot and themes.
    pub async fn summarize(&self, text: &str) -> Result<String> {
        let cleaned = clean_script_text(text);
        let len = cleaned.chars().count();
        if len < MIN_ANALYSIS_CHARS {
            return Err(Error::Extraction(format!(
                "script text too short to analyse ({} chars)",
                len
            )));
        }

        let strategy = summary_strategy(len);
        info!("Summarizing {} chars ({:?})", len, strategy);

        match strategy {
            SummaryStrategy::Single => {
                let request = CompletionRequest::new(
                    format!(
                        "{} 주어진 스크립트에서 1) 주요 인물과 관계, 2) 주요 사건과 줄거리, 3) 주제와 메시지를 정리해 주세요.",
                        SCRIPT_ANALYST
                    ),
                    format!("다음 스크립트를 분석해 주세요:\n\n{}", cleaned),
                )
                .with_max_tokens(1500);
                self.client.complete(&request).await
            }
            SummaryStrategy::HeadTail => {
                let part_system = "당신은 스크립트 분석 전문가입니다. 주어진 부분에서 핵심 정보를 추출해 주세요.";
                let head = CompletionRequest::new(
                    part_system,
                    format!(
                        "다음은 스크립트의 시작 부분입니다. 주요 인물과 관계, 배경 설정에 집중해 분석해 주세요:\n\n{}",
                        head_chars(&cleaned, 5_000)
                    ),
                );
                let head_analysis = self.client.complete(&head).await?;

                let tail = CompletionRequest::new(
                    part_system,
                    format!(
                        "다음은 스크립트의 마지막 부분입니다. 결말, 주제, 메시지에 집중해 분석해 주세요:\n\n{}",
                        tail_chars(&cleaned, 5_000)
                    ),
                );
                let tail_analysis = self.client.complete(&tail).await?;

                let synthesis = CompletionRequest::new(
                    "당신은 스크립트 분석 전문가입니다. 부분 분석을 하나의 전체 요약으로 통합해 주세요.",
                    format!(
                        "시작 부분과 끝 부분의 분석을 통합해 종합적인 요약을 만들어 주세요:\n\n[시작 부분 분석]\n{}\n\n[끝 부분 분석]\n{}",
                        head_analysis, tail_analysis
                    ),
                )
                .with_max_tokens(1500);
                self.client.complete(&synthesis).await
            }
            SummaryStrategy::Sampled => {
                let [head, middle, tail] = sample_windows(&cleaned, 4_000, 4_000, 4_000);
                let request = CompletionRequest::new(
                    "당신은 효율적인 스크립트 분석 전문가입니다. 긴 스크립트의 핵심을 빠르게 파악해야 합니다.",
                    format!(
                        "다음 스크립트의 처음, 중간, 끝 부분을 보고 전체 내용을 추론해 주세요. 주요 인물, 관계, 사건, 줄거리, 주제를 파악하세요:\n\n[스크립트 시작 부분]\n{}\n\n[스크립트 중간 부분]\n{}\n\n[스크립트 끝 부분]\n{}",
                        head, middle, tail
                    ),
                )
                .with_max_tokens(1500);
                self.client.complete(&request).await
            }
        }
    }

    /// Pull title, genre, main characters, plot points and themes out of a summary.
    pub async fn extract_structured(&self, summary: &str) -> Result<StructuredOutput> {
        let prompt = format!(
            r#"다음 스크립트 요약에서 구조화된 데이터를 추출해 주세요:

{}

결과는 다음 형식의 JSON으로 반환해 주세요:
{{
    "title": "작품 제목 (추정)",
    "genre": "추정 장르",
    "main_characters": [{{"name": "인물", "description": "설명"}}],
    "plot_points": ["핵심 줄거리 요소"],
    "themes": ["주제"]
}}"#,
            summary
        );
        let request = CompletionRequest::new(
            "당신은 요약에서 핵심 정보를 JSON으로 추출하는 스크립트 분석가입니다.",
            prompt,
        )
        .with_temperature(0.3)
        .with_max_tokens(800);

        let reply = self.client.complete(&request).await?;
        let parsed = parse_structured(&reply);
        if let StructuredOutput::Raw(_) = parsed {
            debug!("Structured extraction reply was not JSON");
        }
        Ok(parsed)
    }

    /// Free-text analysis of the characters and how they relate.
    pub async fn analyze_characters(&self, text: &str) -> Result<String> {
        let cleaned = clean_script_text(text);
        let excerpt = head_tail_excerpt(&cleaned, 10_000, 5_000);
        let request = CompletionRequest::new(
            "당신은 스크립트에서 등장인물과 그들의 관계를 분석하는 전문가입니다.",
            format!(
                "다음 스크립트의 등장인물과 관계를 분석해 주세요:\n\n{}\n\n다음 형식으로 답해 주세요:\n1. 등장인물 목록: 각 인물의 이름과 간략한 설명\n2. 주요 관계: 한 줄에 하나씩 'A와 B의 관계: 설명' 형식으로\n3. 계층 구조: 가족, 직장 등 인물 간 관계의 계층",
                excerpt
            ),
        );
        self.client.complete(&request).await
    }

    /// A Mermaid `graph TD` diagram of the main characters.
    ///
    /// A reply without diagram code yields a placeholder diagram rather than an error.
    pub async fn character_tree(&self, text: &str) -> Result<String> {
        let cleaned = clean_script_text(text);
        let excerpt = head_tail_excerpt(&cleaned, 8_000, 4_000);
        let request = CompletionRequest::new(
            "당신은 등장인물 관계도를 Mermaid 다이어그램으로 그리는 스크립트 분석가입니다.",
            format!(
                "다음 스크립트의 주요 등장인물과 관계를 트리 구조의 Mermaid 코드로 표현해 주세요.\n\n{}\n\n1. 관계의 중심 인물을 루트 노드로 두세요.\n2. 가족, 친구, 동료 등 관계를 링크로 표시하세요.\n3. 주요 인물은 최대 8-10명만 포함하세요.\n4. 인물 옆에 역할을 간략히 적으세요.\n\n```mermaid\ngraph TD\n  A[주인공] --> B[친구]\n```",
                excerpt
            ),
        )
        .with_max_tokens(800);

        let reply = self.client.complete(&request).await?;
        Ok(extract_mermaid(&reply).unwrap_or_else(|| {
            debug!("Character tree reply had no diagram");
            FALLBACK_TREE.to_string()
        }))
    }

    /// Overall sentiment, dominant emotions and emotional arc, as JSON.
    pub async fn analyze_sentiment(&self, text: &str) -> Result<StructuredOutput> {
        let cleaned = clean_script_text(text);
        let excerpt = head_tail_excerpt(&cleaned, 8_000, 4_000);
        let request = CompletionRequest::new(
            "당신은 스크립트의 감정 분석을 수행하는 전문가입니다.",
            format!(
                r#"다음 스크립트의 전반적인 감정과 분위기를 분석해 주세요.

{}

결과는 다음 형식의 JSON으로 반환해 주세요:
{{
    "overall_sentiment": "긍정적/부정적/중립적",
    "sentiment_score": -1.0에서 1.0 사이의 숫자,
    "dominant_emotions": ["감정1", "감정2", "감정3"],
    "mood_description": "전반적인 분위기",
    "emotional_arcs": ["감정 변화 곡선"]
}}"#,
                excerpt
            ),
        )
        .with_max_tokens(800);

        let reply = self.client.complete(&request).await?;
        Ok(parse_structured(&reply))
    }

    /// Answer one question against the opening of the script.
    pub async fn ask(&self, text: &str, question: &str) -> Result<String> {
        let request = CompletionRequest::new(
            "당신은 영화 시나리오 분석 전문가입니다.",
            format!(
                "대본 내용: {}...\n\n{}",
                head_chars(text, QUESTION_CONTEXT_CHARS),
                question
            ),
        );
        self.client.complete(&request).await
    }

    /// Answer every question of [`QUESTIONS`] in order. A failed question does not stop the rest.
    pub async fn ask_all(&self, text: &str) -> Vec<(&'static str, Result<String>)> {
        let mut answers = Vec::with_capacity(QUESTIONS.len());
        for question in QUESTIONS {
            answers.push((*question, self.ask(text, question).await));
        }
        answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ScriptedClient;

    fn script(len: usize) -> String {
        "MINA: 가자 ".chars().cycle().take(len).collect()
    }

    #[test]
    fn test_strategy_thresholds() {
        assert_eq!(summary_strategy(6_000), SummaryStrategy::Single);
        assert_eq!(summary_strategy(6_001), SummaryStrategy::HeadTail);
        assert_eq!(summary_strategy(12_000), SummaryStrategy::HeadTail);
        assert_eq!(summary_strategy(12_001), SummaryStrategy::Sampled);
    }

    #[tokio::test]
    async fn test_short_text_rejected_without_calls() {
        let client = ScriptedClient::new(["unused"]);
        let analyzer = ScriptAnalyzer::new(&client);
        assert!(matches!(
            analyzer.summarize("too short").await,
            Err(Error::Extraction(_))
        ));
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_single_call_summary() {
        let client = ScriptedClient::new(["a heist goes wrong"]);
        let analyzer = ScriptAnalyzer::new(&client);
        let summary = analyzer.summarize(&script(3_000)).await.unwrap();
        assert_eq!(summary, "a heist goes wrong");
        assert_eq!(client.requests().len(), 1);
        assert_eq!(client.requests()[0].max_tokens, 1500);
    }

    #[tokio::test]
    async fn test_head_tail_summary_makes_three_calls() {
        let client = ScriptedClient::new(["opening", "ending", "combined"]);
        let analyzer = ScriptAnalyzer::new(&client);
        let summary = analyzer.summarize(&script(9_000)).await.unwrap();
        assert_eq!(summary, "combined");

        let requests = client.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[2].user_content().contains("opening"));
        assert!(requests[2].user_content().contains("ending"));
    }

    #[tokio::test]
    async fn test_sampled_summary_makes_one_call() {
        let client = ScriptedClient::new(["sampled"]);
        let analyzer = ScriptAnalyzer::new(&client);
        analyzer.summarize(&script(30_000)).await.unwrap();
        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].user_content().contains("[스크립트 중간 부분]"));
    }

    #[tokio::test]
    async fn test_failed_call_is_an_error_not_text() {
        let client = ScriptedClient::default();
        client.push_error("503 service unavailable");
        let analyzer = ScriptAnalyzer::new(&client);
        assert!(matches!(
            analyzer.summarize(&script(500)).await,
            Err(Error::Completion(_))
        ));
    }

    #[tokio::test]
    async fn test_character_tree_fallback() {
        let client = ScriptedClient::new(["I cannot draw that."]);
        let analyzer = ScriptAnalyzer::new(&client);
        assert_eq!(analyzer.character_tree(&script(500)).await.unwrap(), FALLBACK_TREE);
    }

    #[tokio::test]
    async fn test_sentiment_parsed() {
        let client = ScriptedClient::new([
            "```json\n{\"overall_sentiment\": \"부정적\", \"sentiment_score\": -0.6}\n```",
        ]);
        let analyzer = ScriptAnalyzer::new(&client);
        let sentiment = analyzer.analyze_sentiment(&script(500)).await.unwrap();
        assert_eq!(sentiment.str_field("overall_sentiment"), Some("부정적"));
    }

    #[tokio::test]
    async fn test_ask_all_continues_after_failure() {
        let client = ScriptedClient::new(["answer one"]);
        let analyzer = ScriptAnalyzer::new(&client);
        let answers = analyzer.ask_all(&script(5_000)).await;

        assert_eq!(answers.len(), QUESTIONS.len());
        assert_eq!(answers[0].1.as_deref().unwrap(), "answer one");
        assert!(answers[1].1.is_err());

        let first = &client.requests()[0];
        assert!(first.user_content().ends_with(QUESTIONS[0]));
        assert!(first.user_content().len() < 2_000 * 4 + 200);
    }
}
