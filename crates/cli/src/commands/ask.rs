//! `shanghan ask`: Single-question or interactive mode.

use shanghan_config::AppConfig;
use shanghan_core::{AnswerResult, ConversationTurn};
use shanghan_engine::ChatEngine;
use shanghan_knowledge::KnowledgeStore;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

fn print_answer(result: &AnswerResult) {
    println!("\n{}\n", result.answer);
    if !result.sources.is_empty() {
        println!("Sources:");
        for source in &result.sources {
            println!("  - {source}");
        }
        println!();
    }
}

pub async fn run(config: &AppConfig, message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    if !config.has_api_key() {
        eprintln!("No DEEPSEEK_API_KEY set; answers come from the built-in fallback texts.");
    }

    let client = shanghan_providers::build_from_config(config);
    let engine = ChatEngine::new(client, KnowledgeStore::builtin());

    if let Some(msg) = message {
        let result = engine.process_query(&msg, &[]).await;
        print_answer(&result);
        return Ok(());
    }

    println!("Shang Han Lun assistant ({})", config.model);
    println!("Type a question, or /clear to reset, /quit to exit.\n");

    let mut history: Vec<ConversationTurn> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        match query {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                history.clear();
                println!("History cleared.\n");
                continue;
            }
            _ => {}
        }

        let result = engine.process_query(query, &history).await;
        print_answer(&result);
        history.push(ConversationTurn::user(query));
        history.push(ConversationTurn::assistant(result.answer, result.sources));
    }

    Ok(())
}
