use anyhow::Context;
use chrono::Local;
use churn_insights::{
    ChatSession, Dashboard, DashboardConfig, FileKnowledgeSource, GeminiClient, InsightsAssistant,
    PromptTemplates,
};
use dotenv::dotenv;
use std::io::{self, Write};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DIVIDER: &str = "------------------------------------------------------------------";

fn print_help() {
    println!("Commands:");
    println!("  /report   generate the comprehensive churn report");
    println!("  /summary  show the portfolio summary again");
    println!("  /json     print the portfolio summary as JSON");
    println!("  /samples  list sample questions");
    println!("  /clear    clear the chat session");
    println!("  /reload   reload the knowledge base from disk");
    println!("  /quit     exit");
    println!("Anything else is sent to the AI assistant.");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = DashboardConfig::from_env().context("loading dashboard configuration")?;
    let templates = PromptTemplates::new(&config.brand)?
        .with_history_window(config.history_window)?;
    let client = GeminiClient::from_env(
        config.api_key_env.as_str(),
        Duration::from_secs(config.request_timeout_secs),
    )?;
    let source = FileKnowledgeSource::from_config(&config);
    let dashboard = Dashboard::new(config, InsightsAssistant::new(client, templates), source);

    println!("{}\n", dashboard.header());
    println!("{}", dashboard.overview());
    println!("{}", DIVIDER);
    println!("🤖 AI Assistant: ask about churn rate, customer segments, or balance insights.");
    print_help();
    println!("{}", DIVIDER);

    let mut session = ChatSession::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let line = input.trim();

        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => print_help(),
            "/summary" => println!("{}", dashboard.overview()),
            "/json" => match dashboard.summary_json() {
                Ok(json) => println!("{}", json),
                Err(e) => println!("⚠️ {}", e),
            },
            "/samples" => {
                println!("💡 Sample Questions");
                for question in dashboard.sample_questions() {
                    println!("- {}", question);
                }
            }
            "/clear" => {
                session.clear();
                println!("🗑️ Chat cleared.");
            }
            "/reload" => {
                dashboard.reload();
                println!("{}", dashboard.overview());
            }
            "/report" => {
                println!("\nGenerating churn insights report...");
                let report = dashboard.report(Local::now().date_naive()).await;
                println!("\n📋 Comprehensive Business Insights Report\n\n{}\n", report);
                println!("{}", DIVIDER);
            }
            question => {
                println!("\nAnalyzing churn data...");
                let answer = dashboard.ask(&mut session, question).await;
                println!("\n{}\n", answer);
                println!("{}", DIVIDER);
            }
        }
    }

    Ok(())
}
