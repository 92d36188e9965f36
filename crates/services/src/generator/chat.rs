use std::env;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use rand::seq::IndexedRandom;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use quiz_core::model::{Question, QuestionDraft};

use super::{GenerateRequest, QuestionGenerator};
use crate::error::SourceError;

/// Category pool the generator rotates through to avoid repeats.
pub const CATEGORIES: [&str; 15] = [
    "基础规则",
    "牌型判断",
    "搭档配合",
    "炸弹使用",
    "出牌时机",
    "首家策略",
    "进攻策略",
    "防守策略",
    "级牌规则",
    "升级计分",
    "复杂局面",
    "心理博弈",
    "特殊牌型",
    "残局技巧",
    "开局布局",
];

const REQUIRED_FIELDS: [&str; 4] = ["text", "options", "answer", "explanation"];
const OPTION_COUNT: usize = 4;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Clone, Debug)]
pub struct ChatGeneratorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl ChatGeneratorConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("QUIZ_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("QUIZ_AI_BASE_URL").unwrap_or_else(|_| "https://api.moonshot.cn/v1".into());
        let model = env::var("QUIZ_AI_MODEL").unwrap_or_else(|_| "moonshot-v1-32k".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Difficulty and point value for a position in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionPlan {
    pub difficulty: u8,
    pub points: u32,
}

impl QuestionPlan {
    /// Difficulty ramps up over the session: three easy questions, three
    /// medium, two hard, then the hardest.
    #[must_use]
    pub fn for_index(index: usize) -> Self {
        let (difficulty, points) = match index {
            0..=2 => (2, 8),
            3..=5 => (3, 10),
            6..=7 => (4, 12),
            _ => (5, 15),
        };
        Self { difficulty, points }
    }
}

/// Choose a category not yet used this session; once all are used the whole
/// pool is available again.
pub fn pick_category<R: Rng + ?Sized>(used: &[String], rng: &mut R) -> &'static str {
    let available: Vec<&'static str> = CATEGORIES
        .iter()
        .copied()
        .filter(|cat| !used.iter().any(|u| u == cat))
        .collect();
    let pool: &[&'static str] = if available.is_empty() {
        &CATEGORIES
    } else {
        &available
    };
    pool.choose(rng).copied().unwrap_or(CATEGORIES[0])
}

/// Generates questions by prompting an OpenAI-compatible chat model directly.
#[derive(Clone)]
pub struct ChatQuestionGenerator {
    client: Client,
    config: Option<ChatGeneratorConfig>,
}

impl ChatQuestionGenerator {
    #[must_use]
    pub fn new(config: Option<ChatGeneratorConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    async fn complete(
        &self,
        config: &ChatGeneratorConfig,
        prompt: String,
    ) -> Result<String, SourceError> {
        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.3,
            max_tokens: 1200,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .map_err(|err| SourceError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::Rejected(format!(
                "model request failed with status {}",
                response.status()
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|err| SourceError::Rejected(err.to_string()))?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| SourceError::Rejected("model returned an empty response".into()))
    }
}

#[async_trait]
impl QuestionGenerator for ChatQuestionGenerator {
    async fn generate(&self, request: &GenerateRequest) -> Result<Question, SourceError> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| SourceError::Rejected("未配置 API key（QUIZ_AI_API_KEY）".into()))?;

        let plan = QuestionPlan::for_index(request.question_index);
        let category = pick_category(&request.used_categories, &mut rand::rng());
        tracing::debug!(
            index = request.question_index,
            category,
            difficulty = plan.difficulty,
            "prompting model for question"
        );

        let raw = self.complete(config, build_prompt(category, plan)).await?;
        parse_question(&raw)
    }
}

fn build_prompt(category: &str, plan: QuestionPlan) -> String {
    let QuestionPlan { difficulty, points } = plan;
    format!(
        r#"你是一位掼蛋扑克专家，请生成一道高质量的掼蛋知识测试题。

规则要点（出题前必须核对）：
- 点数：3<4<5<6<7<8<9<10<J<Q<K<A<2<小王<大王；级牌排在A之上、2之下
- 同类牌型比点数；炸弹管一切非炸弹；炸弹之间张数多者大，同张数比点数
- 天王炸管所有炸弹；不同牌型不能互管
- 合法牌型：单张、对子、三张、三带二、顺子（5张）、三连对、钢板、同花顺、四张及以上炸弹
- 红桃级牌可作万能牌

出题要求：
1. 类别：{category}
2. 难度：{difficulty}（1-5）
3. 四个选项，只有一个正确答案
4. 解析40字以内
5. 涉及具体牌局时给出 scene 字段，纯规则题 scene 为 null

只输出如下JSON，不要任何额外内容：
{{
  "category": "{category}",
  "difficulty": {difficulty},
  "points": {points},
  "text": "一句话问题",
  "options": ["A. 选项一", "B. 选项二", "C. 选项三", "D. 选项四"],
  "answer": 0,
  "explanation": "极简解析",
  "scene": null
}}"#
    )
}

/// Pull the question JSON out of a model reply.
///
/// Accepts a bare JSON object or one wrapped in prose/code fences.
fn parse_question(raw: &str) -> Result<Question, SourceError> {
    let value = serde_json::from_str::<serde_json::Value>(raw.trim())
        .ok()
        .or_else(|| {
            let start = raw.find('{')?;
            let end = raw.rfind('}')?;
            (start < end)
                .then(|| serde_json::from_str(&raw[start..=end]).ok())
                .flatten()
        })
        .ok_or_else(|| SourceError::Rejected("AI返回内容无法解析为JSON".into()))?;

    for field in REQUIRED_FIELDS {
        if value.get(field).is_none() {
            return Err(SourceError::Rejected(format!("缺少字段: {field}")));
        }
    }
    let option_count = value["options"].as_array().map_or(0, Vec::len);
    if option_count != OPTION_COUNT {
        return Err(SourceError::Rejected("选项必须是4个".into()));
    }
    match value["answer"].as_u64() {
        Some(answer) if answer < OPTION_COUNT as u64 => {}
        _ => return Err(SourceError::Rejected("answer 必须是 0-3 的整数".into())),
    }

    let draft: QuestionDraft =
        serde_json::from_value(value).map_err(|err| SourceError::Rejected(err.to_string()))?;
    Ok(draft.validate()?)
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const REPLY: &str = r#"{
        "category": "出牌时机",
        "difficulty": 3,
        "points": 10,
        "text": "此时最优出牌是？",
        "options": ["A. 出对子", "B. 出炸弹", "C. 过牌", "D. 出单张"],
        "answer": 2,
        "explanation": "保留炸弹等待时机。",
        "scene": {"hero_hand": ["A♠"], "table_play": [], "hint": "轮到你"}
    }"#;

    #[test]
    fn plan_ramps_with_index() {
        assert_eq!(QuestionPlan::for_index(0), QuestionPlan { difficulty: 2, points: 8 });
        assert_eq!(QuestionPlan::for_index(2).points, 8);
        assert_eq!(QuestionPlan::for_index(3).points, 10);
        assert_eq!(QuestionPlan::for_index(5).difficulty, 3);
        assert_eq!(QuestionPlan::for_index(7), QuestionPlan { difficulty: 4, points: 12 });
        assert_eq!(QuestionPlan::for_index(9), QuestionPlan { difficulty: 5, points: 15 });
    }

    #[test]
    fn picks_only_unused_categories() {
        let used: Vec<String> = CATEGORIES[..14].iter().map(|c| (*c).to_string()).collect();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(pick_category(&used, &mut rng), CATEGORIES[14]);
        }
    }

    #[test]
    fn exhausted_pool_starts_over() {
        let used: Vec<String> = CATEGORIES.iter().map(|c| (*c).to_string()).collect();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(CATEGORIES.contains(&pick_category(&used, &mut rng)));
    }

    #[test]
    fn prompt_mentions_plan() {
        let prompt = build_prompt("残局技巧", QuestionPlan::for_index(8));
        assert!(prompt.contains("类别：残局技巧"));
        assert!(prompt.contains("\"points\": 15"));
    }

    #[test]
    fn parses_bare_json_reply() {
        let question = parse_question(REPLY).unwrap();
        assert_eq!(question.answer_index(), 2);
        assert!(question.scene().is_some());
    }

    #[test]
    fn parses_reply_wrapped_in_code_fence() {
        let wrapped = format!("好的，题目如下：\n```json\n{REPLY}\n```");
        assert_eq!(parse_question(&wrapped).unwrap().category(), "出牌时机");
    }

    #[test]
    fn rejects_reply_without_json() {
        assert_eq!(
            parse_question("抱歉，我无法出题"),
            Err(SourceError::Rejected("AI返回内容无法解析为JSON".into()))
        );
    }

    #[test]
    fn rejects_reply_missing_explanation() {
        let raw = r#"{"text": "?", "options": ["a", "b", "c", "d"], "answer": 1}"#;
        assert_eq!(
            parse_question(raw),
            Err(SourceError::Rejected("缺少字段: explanation".into()))
        );
    }

    #[test]
    fn rejects_wrong_option_count_and_answer() {
        let three = r#"{"text": "?", "options": ["a", "b", "c"], "answer": 1, "explanation": ""}"#;
        assert!(matches!(parse_question(three), Err(SourceError::Rejected(_))));

        let bad_answer =
            r#"{"text": "?", "options": ["a", "b", "c", "d"], "answer": 4, "explanation": ""}"#;
        assert!(matches!(parse_question(bad_answer), Err(SourceError::Rejected(_))));
    }

    #[tokio::test]
    async fn missing_key_is_rejected() {
        let generator = ChatQuestionGenerator::new(None);
        assert!(!generator.enabled());
        let request = GenerateRequest {
            question_index: 0,
            used_categories: Vec::new(),
        };
        assert!(matches!(
            generator.generate(&request).await,
            Err(SourceError::Rejected(_))
        ));
    }
}
