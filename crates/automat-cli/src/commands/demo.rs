//! Demo command: runs the Counter, Temperature Converter and Flight Booker
//! machines on a scheduler thread.
//!
//! Every edit is submitted from this thread with
//! `run_on_automat_thread_synchronous`. The scheduler thread drains the
//! queue before it takes the next closure, so a read submitted after an edit
//! sees all of its consequences.

use anyhow::Context;
use automat_config::RuntimeConfig;
use automat_core::{Automat, AutomatHandle, AutomatThread, GraphError};
use automat_library::Alert;
use clap::{Args, Subcommand, ValueEnum};
use std::sync::mpsc;

use crate::scenarios::{self, ONE_WAY, RETURN};

#[derive(Args)]
pub struct DemoArgs {
    #[command(subcommand)]
    demo: Demo,
}

#[derive(Subcommand)]
enum Demo {
    /// Click a counter button
    Counter {
        /// Number of clicks
        #[arg(long, default_value_t = 3)]
        clicks: u32,
    },

    /// Convert between Celsius and Fahrenheit
    Temperature {
        /// Temperature in Celsius to convert
        #[arg(long, allow_hyphen_values = true)]
        celsius: Option<String>,

        /// Temperature in Fahrenheit to convert
        #[arg(long, allow_hyphen_values = true)]
        fahrenheit: Option<String>,
    },

    /// Book a flight
    Flight {
        /// Flight type
        #[arg(long, value_enum, default_value_t = FlightMode::OneWay)]
        mode: FlightMode,

        /// Departure date (YYYY-MM-DD)
        #[arg(long)]
        depart: String,

        /// Return date (YYYY-MM-DD), defaults to the departure date
        #[arg(long = "return")]
        return_date: Option<String>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FlightMode {
    OneWay,
    Return,
}

impl FlightMode {
    fn option(self) -> &'static str {
        match self {
            FlightMode::OneWay => ONE_WAY,
            FlightMode::Return => RETURN,
        }
    }
}

pub fn run(args: DemoArgs, config: &RuntimeConfig) -> anyhow::Result<()> {
    match args.demo {
        Demo::Counter { clicks } => counter(config, clicks),
        Demo::Temperature {
            celsius,
            fahrenheit,
        } => temperature(config, celsius, fahrenheit),
        Demo::Flight {
            mode,
            depart,
            return_date,
        } => flight(config, mode, depart, return_date),
    }
}

/// Spawns the scheduler thread and waits for `build` to wire the graph.
fn start<T: Send + 'static>(
    config: &RuntimeConfig,
    build: fn(&mut Automat) -> Result<T, GraphError>,
) -> anyhow::Result<(AutomatThread, AutomatHandle, T)> {
    let (tx, rx) = mpsc::channel();
    let thread = AutomatThread::spawn(config.thread_options(), move |rt| {
        let _ = tx.send(build(rt));
    })
    .context("failed to start the automat thread")?;
    let ids = rx
        .recv()
        .context("the automat thread exited while building the demo")?
        .context("failed to build the demo machine")?;
    let handle = thread.handle();
    Ok((thread, handle, ids))
}

fn counter(config: &RuntimeConfig, clicks: u32) -> anyhow::Result<()> {
    let (thread, handle, counter) = start(config, scenarios::counter)?;

    let text = handle.run_on_automat_thread_synchronous(move |rt| rt.text(counter.count))?;
    println!("Count: {text}");
    for click in 1..=clicks {
        handle.run_on_automat_thread_synchronous(move |rt| rt.schedule_run(counter.button))?;
        let text = handle.run_on_automat_thread_synchronous(move |rt| rt.text(counter.count))?;
        println!("Click {click}: {text}");
    }

    let errors = handle.run_on_automat_thread_synchronous(move |rt| {
        scenarios::error_texts(rt, counter.machine)
    })?;
    thread.stop()?;
    report(&errors)
}

fn temperature(
    config: &RuntimeConfig,
    celsius: Option<String>,
    fahrenheit: Option<String>,
) -> anyhow::Result<()> {
    let (thread, handle, temperature) = start(config, scenarios::temperature)?;

    let edits = [
        (temperature.celsius, celsius),
        (temperature.fahrenheit, fahrenheit),
    ];
    for (field, value) in edits {
        let Some(value) = value else {
            continue;
        };
        handle.run_on_automat_thread_synchronous(move |rt| rt.set_text(field, &value))?;
    }

    let (celsius, fahrenheit, errors) = handle.run_on_automat_thread_synchronous(move |rt| {
        (
            rt.text(temperature.celsius),
            rt.text(temperature.fahrenheit),
            scenarios::error_texts(rt, temperature.machine),
        )
    })?;
    println!("Celsius: {celsius}");
    println!("Fahrenheit: {fahrenheit}");
    thread.stop()?;
    report(&errors)
}

fn flight(
    config: &RuntimeConfig,
    mode: FlightMode,
    depart: String,
    return_date: Option<String>,
) -> anyhow::Result<()> {
    let (thread, handle, booker) = start(config, scenarios::flight_booker)?;

    let return_date = return_date.unwrap_or_else(|| depart.clone());
    handle.run_on_automat_thread_synchronous(move |rt| {
        rt.set_text(booker.flight_type, mode.option());
        rt.set_text(booker.departure, &depart);
        rt.set_text(booker.return_date, &return_date);
    })?;
    handle.run_on_automat_thread_synchronous(move |rt| rt.schedule_run(booker.book))?;

    let (shown, errors) = handle.run_on_automat_thread_synchronous(move |rt| {
        let shown = rt
            .object_as::<Alert>(booker.alert)
            .map(|alert| alert.shown().to_vec())
            .unwrap_or_default();
        (shown, scenarios::error_texts(rt, booker.machine))
    })?;
    for message in &shown {
        println!("{message}");
    }
    thread.stop()?;
    report(&errors)
}

fn report(errors: &[String]) -> anyhow::Result<()> {
    if errors.is_empty() {
        return Ok(());
    }
    for error in errors {
        println!("Error: {error}");
    }
    anyhow::bail!("the machine reported {} error(s)", errors.len())
}
