use std::io::Write;

use quiz_core::model::{Question, QuizMode};
use services::{
    Advance, AnswerFeedback, Presenter, QuizController, QuizError, ResultSummary, Screen,
    SplashInfo,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Renders quiz screens as plain text on stdout.
pub struct ConsolePresenter;

impl ConsolePresenter {
    fn flush() {
        let _ = std::io::stdout().flush();
    }
}

impl Presenter for ConsolePresenter {
    fn show_screen(&self, screen: Screen) {
        match screen {
            Screen::Splash => println!("\n==== 掼蛋水平测试 ===="),
            Screen::Quiz => println!("\n---- 答题开始 ----"),
            Screen::Result => println!("\n==== 测试结果 ===="),
        }
    }

    fn show_splash(&self, info: &SplashInfo) {
        println!("已有 {} 人参与测试", info.players_tested);
        println!("[c] 经典题库   [a] AI出题   [q] 退出");
        Self::flush();
    }

    fn show_question(&self, question: &Question, index: usize, total: usize) {
        println!(
            "\n第 {}/{} 题 · {} · {}分",
            index + 1,
            total,
            question.category(),
            question.points()
        );
        println!("{}", question.text());
        for (number, option) in question.options().iter().enumerate() {
            println!("  [{}] {option}", number + 1);
        }
        Self::flush();
    }

    fn show_answer_feedback(&self, feedback: &AnswerFeedback) {
        if feedback.was_correct {
            println!("回答正确");
        } else {
            println!("回答错误，正确答案是第 {} 项", feedback.correct_index + 1);
        }
        if !feedback.explanation_preview.is_empty() {
            println!("{}", feedback.explanation_line());
        }
        println!("[n] {}", feedback.next_label());
        Self::flush();
    }

    fn show_loading(&self, loading: bool) {
        if loading {
            println!("AI正在出题…");
            Self::flush();
        }
    }

    fn show_result(&self, summary: &ResultSummary) {
        let result = summary.result;
        let stars: String = (0..5)
            .map(|i| if i < result.stars() { '★' } else { '☆' })
            .collect();
        println!("{} {} 分 · {}", result.tier.icon(), result.score, result.headline());
        println!("{stars}");
        println!("{}", summary.skill_line());
        println!("{}", summary.percentile_line());
        println!("{}", summary.detail_line());
        println!("[c] 再来一局   [a] AI出题   [m] 返回首页   [q] 退出");
        Self::flush();
    }

    fn show_error(&self, message: &str) {
        eprintln!("{message}");
        eprintln!("[r] 重试   [m] 返回首页");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Start(QuizMode),
    Select(usize),
    Next,
    Retry,
    Menu,
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" | "n" | "next" => return Some(Input::Next),
        "c" | "classic" => return Some(Input::Start(QuizMode::Classic)),
        "a" | "ai" => return Some(Input::Start(QuizMode::Ai)),
        "r" | "retry" => return Some(Input::Retry),
        "m" | "menu" => return Some(Input::Menu),
        "q" | "quit" | "exit" => return Some(Input::Quit),
        _ => {}
    }

    // Options are numbered from 1.
    line.parse::<usize>()
        .ok()
        .and_then(|number| number.checked_sub(1))
        .map(Input::Select)
}

fn report(err: &QuizError) {
    match err {
        // Already rendered through the presenter.
        QuizError::Source(_) => {}
        QuizError::NoSession => println!("请先选择 [c] 经典题库 或 [a] AI出题"),
        QuizError::Finished => println!("本局已结束：[c] 再来一局 或 [m] 返回首页"),
        other => println!("{other}"),
    }
}

/// Read commands from stdin and drive the controller until quit or EOF.
///
/// # Errors
///
/// Returns an error if stdin cannot be read.
pub async fn run_loop(
    controller: &mut QuizController,
    start: Option<QuizMode>,
) -> std::io::Result<()> {
    match start {
        Some(mode) => {
            if let Err(err) = controller.start(mode).await {
                report(&err);
            }
        }
        None => {
            controller.show_splash().await;
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(input) = parse_input(&line) else {
            println!("无法识别的输入：{}", line.trim());
            continue;
        };

        let outcome = match input {
            Input::Quit => break,
            Input::Start(mode) => controller.start(mode).await,
            Input::Select(option) => {
                if controller.select_option(option).is_none() {
                    tracing::debug!(option, "selection ignored");
                }
                Ok(())
            }
            Input::Next => controller.advance().await.map(|step| {
                if let Advance::Question(index) = step {
                    tracing::debug!(index, "advanced");
                }
            }),
            Input::Retry => controller.reload().await,
            Input::Menu => {
                controller.close().await;
                Ok(())
            }
        };
        if let Err(err) = outcome {
            report(&err);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers_as_options() {
        assert_eq!(parse_input("1"), Some(Input::Select(0)));
        assert_eq!(parse_input(" 4 "), Some(Input::Select(3)));
        assert_eq!(parse_input("0"), None);
        assert_eq!(parse_input("-1"), None);
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_input(""), Some(Input::Next));
        assert_eq!(parse_input("next"), Some(Input::Next));
        assert_eq!(parse_input("C"), Some(Input::Start(QuizMode::Classic)));
        assert_eq!(parse_input("ai"), Some(Input::Start(QuizMode::Ai)));
        assert_eq!(parse_input("r"), Some(Input::Retry));
        assert_eq!(parse_input("m"), Some(Input::Menu));
        assert_eq!(parse_input("quit"), Some(Input::Quit));
        assert_eq!(parse_input("hello"), None);
    }
}
