use anyhow::Result;
use clap::Parser;
use engine::persist::{load_index, IndexPaths};
use engine::query::{contains_operator, evaluate, parse_query, rank_phrase};
use engine::tokenizer::tokenize_terms;
use engine::{query_profile, IndexStats, PositionalIndex, QueryProfile};
use std::io::{self, Write};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "console")]
#[command(about = "Interactive query console over a positional index", long_about = None)]
struct Args {
    /// Index directory path
    #[arg(long, default_value = "./index")]
    index: String,
    /// Print the statistics tables before the prompt
    #[arg(long, default_value_t = false)]
    tables: bool,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let (index, meta) = load_index(&IndexPaths::new(&args.index))?;
    let stats = IndexStats::compute(&index);
    tracing::info!(
        num_docs = index.num_docs(),
        num_terms = index.num_terms(),
        created_at = %meta.created_at,
        "index ready"
    );

    if args.tables {
        print_tables(&index, &stats);
    }

    loop {
        print!("Enter a search query (or type 'exit' to quit): ");
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.eq_ignore_ascii_case("exit") {
            break;
        }
        if line.is_empty() {
            continue;
        }
        handle_query(&index, &stats, line);
    }
    Ok(())
}

/// Boolean queries go through the combinator, everything else is a phrase
/// query. The diagnostic profile prints ahead of any results; an empty
/// result prints only the no-documents line. Classified query errors are
/// printed and the prompt continues.
fn handle_query(index: &PositionalIndex, stats: &IndexStats, line: &str) {
    let outcome = if contains_operator(line) {
        parse_query(line).and_then(|query| {
            let ranked = evaluate(index, stats, &query)?;
            Ok((ranked, query.terms()))
        })
    } else {
        let terms = tokenize_terms(line);
        rank_phrase(index, stats, &terms).map(|ranked| (ranked, terms))
    };

    match outcome {
        Ok((ranked, terms)) => {
            if ranked.is_empty() {
                println!("No relevant documents found.");
            } else {
                print_profile(&query_profile(stats, &terms, &ranked));
                for (doc, score) in &ranked {
                    println!("Document {doc}: Similarity = {score:.4}");
                }
                let ids: Vec<&str> = ranked.iter().map(|(d, _)| d.as_str()).collect();
                println!("Relevant Docs are: {}", ids.join(", "));
            }
        }
        Err(err) => println!("{err}"),
    }
}

fn print_profile(profile: &QueryProfile) {
    println!("\nQuery term statistics:");
    println!(
        "{:<15}{:<10}{:<10}{:<10}{:<10}{:<12}",
        "Term", "TF", "WTF", "IDF", "TFIDF", "Normalized"
    );
    for t in &profile.terms {
        println!(
            "{:<15}{:<10.2}{:<10.2}{:<10.2}{:<10.2}{:<12.4}",
            t.term, t.tf, t.weighted_tf, t.idf, t.tfidf, t.normalized
        );
    }
    println!("Query length: {:.4}", profile.query_length);

    if !profile.contributions.is_empty() {
        println!("\nPer-document contributions:");
        println!("{:<15}{:<15}{:<10}", "Term", "Document", "Value");
        for c in &profile.contributions {
            println!("{:<15}{:<15}{:<10.4}", c.term, c.doc, c.value);
        }
    }
    if !profile.similarities.is_empty() {
        println!("\nQuery-vector similarities:");
        for (doc, sim) in &profile.similarities {
            println!("{doc:<15}{sim:<10.4}");
        }
    }
    println!();
}

fn print_tables(index: &PositionalIndex, stats: &IndexStats) {
    print_cell_table("TF Table:", index, |term, doc| stats.tf(term, doc) as f64);
    print_cell_table("Weighted TF Table:", index, |term, doc| {
        stats.weighted_tf(term, doc)
    });

    println!("\nDF and IDF:");
    println!("{:<15}{:<10}{:<10}", "Term", "DF", "IDF");
    for term in index.terms() {
        let idf = stats.idf(term).unwrap_or(0.0);
        println!("{:<15}{:<10}{:<10.2}", term, stats.df(term), idf);
    }

    print_cell_table("TF-IDF Table:", index, |term, doc| stats.tfidf(term, doc));
    print_cell_table("Normalized TF-IDF Table:", index, |term, doc| {
        stats.normalized_tfidf(term, doc)
    });

    println!("\nDocument Lengths:");
    println!("{:<15}{:<10}", "Document", "Length");
    for doc in index.documents() {
        println!("{:<15}{:<10.2}", doc, stats.doc_length(doc));
    }
    println!();
}

fn print_cell_table(title: &str, index: &PositionalIndex, value: impl Fn(&str, &str) -> f64) {
    println!("\n{title}");
    print!("{:<15}", "Term");
    for doc in index.documents() {
        print!("{doc:<10}");
    }
    println!();
    for term in index.terms() {
        print!("{term:<15}");
        for doc in index.documents() {
            print!("{:<10.2}", value(term, doc));
        }
        println!();
    }
}
