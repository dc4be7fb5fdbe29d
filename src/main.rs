use std::path::PathBuf;

use chrono::NaiveTime;

use daily_quotes::config::Config;
use daily_quotes::dataset;
use daily_quotes::error::Result;
use daily_quotes::models::Quote;
use daily_quotes::scheduler::LogNotifier;
use daily_quotes::App;

const USAGE: &str = "\
Usage: daily-quotes [COMMAND]

  (no command)                 show quotes for the saved search
  --seed <file.json>           seed an empty database from a dataset file
  --search <filter> <query>    search by Author or Subject and remember it
  --deleted                    show recently deleted quotes
  --count <view> [key]         count quotes (All, Favorites, Top 100, ...)
  --distinct <author|subject>  list values for a filter picker
  --favorite <id>              toggle favorite
  --delete <id> | --restore <id>
  --schedule                   recompute and print the notification plan
  --window <HH:MM> <HH:MM>     set the notification window
  --spacing <minutes>          set minutes between notifications
  --notifications <on|off>     enable or disable notifications";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::load()?;

    // Seeding from a file must happen before the bundled dataset is applied
    if let [flag, path] = args.as_slice() {
        if flag == "--seed" {
            let repository = daily_quotes::db::Repository::new(&config.db_path).await?;
            let inserted = repository
                .seed_if_empty(dataset::load_file(&PathBuf::from(path))?)
                .await?;
            println!("Seeded {} quotes from {:?}", inserted, path);
            return Ok(());
        }
    }

    let app = App::new(&config, LogNotifier).await?;
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        [] => {
            println!("{}", app.title().await?);
            print_quotes(&app.current_quotes().await?);
        }
        ["--search", filter, query @ ..] if !query.is_empty() => {
            let (title, quotes) = app.apply_search(&query.join(" "), filter).await?;
            println!("{}", title);
            print_quotes(&quotes);
        }
        ["--deleted"] => {
            print_quotes(&app.repository.query_by_filter("", "deleted").await?);
        }
        ["--count", view, key @ ..] => {
            let count = app.repository.count(&key.join(" "), view).await?;
            println!("{}", count);
        }
        ["--distinct", column] => {
            for value in app.repository.distinct_values_for(column).await? {
                println!("{}", value);
            }
        }
        ["--favorite", id] => {
            let favorite = app.toggle_favorite(parse_id(id)?).await?;
            println!("{}", if favorite { "Favorited" } else { "Unfavorited" });
        }
        ["--delete", id] => {
            app.delete_quote(parse_id(id)?).await?;
            println!("Moved to recently deleted");
        }
        ["--restore", id] => {
            app.restore_quote(parse_id(id)?).await?;
            println!("Restored");
        }
        ["--schedule"] => {
            print_plan(&app.scheduler.recompute().await?.fire_times);
        }
        ["--window", start, end] => {
            let plan = app
                .scheduler
                .set_window(parse_time(start)?, parse_time(end)?)
                .await?;
            print_plan(&plan.fire_times);
        }
        ["--spacing", minutes] => {
            let minutes = parse_spacing(minutes)?;
            print_plan(&app.scheduler.set_spacing(minutes).await?.fire_times);
        }
        ["--notifications", state] => {
            let allow = match *state {
                "on" => true,
                "off" => false,
                other => return Err(anyhow::anyhow!("Expected on or off, got {}", other).into()),
            };
            print_plan(&app.scheduler.set_allow_notifications(allow).await?.fire_times);
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }

    Ok(())
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| anyhow::anyhow!("Invalid quote id: {}", raw).into())
}

fn parse_spacing(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| anyhow::anyhow!("Invalid spacing: {}", raw).into())
}

fn parse_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map_err(|e| anyhow::anyhow!("Invalid time {}: {}", raw, e).into())
}

fn print_quotes(quotes: &[Quote]) {
    for quote in quotes {
        let marker = if quote.favorite { "*" } else { " " };
        println!("{} [{}] \"{}\" - {}", marker, quote.id, quote.quote_text, quote.author);
    }
}

fn print_plan(fire_times: &[chrono::DateTime<chrono::Local>]) {
    if fire_times.is_empty() {
        println!("No notifications scheduled");
    }
    for at in fire_times {
        println!("{}", at.format("%a %H:%M"));
    }
}
