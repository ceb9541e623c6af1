use std::{fmt::Write as _, path::PathBuf};

use anyhow::Context;
use chrono::Utc;
use cityair_core::{AggregatedResult, Aggregator, AqiBand, Config};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use crate::web;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityair", version, about = "City weather and air-quality dashboard backend")]
pub struct Cli {
    /// Read configuration from this file instead of the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the client identifier sent to upstream providers.
    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server.
    Serve {
        /// Listen address, e.g. "0.0.0.0:8080".
        #[arg(long)]
        bind: Option<String>,
    },

    /// Show weather and air quality for a city.
    Lookup {
        /// City or place name.
        city: String,

        /// Print the raw JSON document instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Show two cities next to each other.
    Compare { city: String, other: String },

    /// Store the client identifier and listen address in the config file.
    Configure {
        /// Client identifier; prompted for when omitted.
        #[arg(long = "set-user-agent")]
        set_user_agent: Option<String>,

        #[arg(long)]
        bind: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = self.load_config()?;
        if let Some(user_agent) = self.user_agent {
            config.set_user_agent(user_agent);
        }

        match self.command {
            Command::Serve { bind } => {
                let addr = bind.as_deref().unwrap_or(config.bind_addr());
                let aggregator = Aggregator::from_config(&config)?;
                let listener = TcpListener::bind(addr)
                    .await
                    .with_context(|| format!("Failed to bind {addr}"))?;

                tracing::info!(addr, user_agent = config.user_agent(), "Serving city data");
                web::serve(listener, aggregator).await?;
            }
            Command::Lookup { city, json } => {
                let aggregator = Aggregator::from_config(&config)?;
                let result = aggregator.aggregate(&city).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                } else {
                    print!("{}", render_summary(&result));
                }
            }
            Command::Compare { city, other } => {
                let aggregator = Aggregator::from_config(&config)?;
                let (first, second) =
                    tokio::try_join!(aggregator.aggregate(&city), aggregator.aggregate(&other))?;

                print!(
                    "{}",
                    side_by_side(&render_summary(&first), &render_summary(&second))
                );
            }
            Command::Configure { set_user_agent, bind } => {
                let user_agent = match set_user_agent {
                    Some(ua) => ua,
                    None => inquire::Text::new("Client identifier (app name and contact):")
                        .with_default(config.user_agent())
                        .prompt()
                        .context("Failed to read client identifier")?,
                };
                config.set_user_agent(user_agent);
                if let Some(bind) = bind {
                    config.set_bind_addr(bind);
                }

                let path = match &self.config {
                    Some(path) => {
                        config.save_to(path)?;
                        path.clone()
                    }
                    None => config.save()?,
                };
                println!("Saved configuration to {}", path.display());
            }
        }

        Ok(())
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        }
    }
}

fn render_summary(result: &AggregatedResult) -> String {
    let mut out = String::new();
    let c = &result.current;
    let a = &result.aq_now;

    let _ = writeln!(out, "{}", result.city);
    let _ = writeln!(
        out,
        "  lat {:.3}, lon {:.3} (fetched {})",
        result.coords.lat,
        result.coords.lon,
        Utc::now().format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(
        out,
        "  temperature {} °C, humidity {} %, wind {} km/h",
        reading(c.temperature_c),
        reading(c.humidity_pct),
        reading(c.wind_speed_kmh)
    );

    let band = AqiBand::from_pm2_5(a.pm2_5)
        .map(|b| format!(" [{b}]"))
        .unwrap_or_default();
    let _ = writeln!(out, "  PM2.5 {} µg/m³{band}, PM10 {} µg/m³", reading(a.pm2_5), reading(a.pm10));
    let _ = writeln!(
        out,
        "  CO {}, O3 {}, NO2 {}, SO2 {} µg/m³",
        reading(a.co),
        reading(a.o3),
        reading(a.no2),
        reading(a.so2)
    );
    let _ = writeln!(out, "  {} hourly points", result.series.time.len());

    out
}

/// Lay two multi-line blocks out in columns, padding the left one.
fn side_by_side(left: &str, right: &str) -> String {
    const GUTTER: usize = 4;

    let width = left.lines().map(|l| l.chars().count()).max().unwrap_or(0) + GUTTER;
    let left: Vec<&str> = left.lines().collect();
    let right: Vec<&str> = right.lines().collect();

    let mut out = String::new();
    for i in 0..left.len().max(right.len()) {
        let l = left.get(i).copied().unwrap_or("");
        let _ = match right.get(i) {
            Some(r) => writeln!(out, "{l:<width$}{r}"),
            None => writeln!(out, "{l}"),
        };
    }
    out
}

fn reading(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.1}")).unwrap_or_else(|| "—".to_string())
}
