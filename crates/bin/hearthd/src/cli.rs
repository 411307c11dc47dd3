//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use hearth_domain::device::DeviceCategory;
use hearth_domain::id::{DeviceId, RoomId, ScheduleId, SensorId, UserId};

#[derive(Parser)]
#[command(name = "hearthd")]
#[command(author, version, about = "Home device and sensor hub")]
#[command(
    long_about = "Records device and sensor feeds, watches readings against per-sensor plans,\n\
    fires scheduled actions and reports device usage.\n\
    \nWithout a subcommand the daemon is started.\n\
    \nExamples:\n  \
    hearthd                                   # run the daemon\n  \
    hearthd inventory                         # list registered devices and sensors\n  \
    hearthd plan set --sensor <id> --upper 28\n  \
    hearthd report usage --device <id> --days 7\n  \
    hearthd logs sensor --sensor <id> --hours 24"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "hearth.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the daemon: feed ingestion, threshold alerts and the scheduler
    Serve,
    /// List registered devices and sensors
    Inventory,
    /// Manage the threshold plan of a sensor
    #[command(subcommand)]
    Plan(PlanCommand),
    /// Manage scheduled device actions
    #[command(subcommand)]
    Schedule(ScheduleCommand),
    /// Usage, energy and reading reports
    #[command(subcommand)]
    Report(ReportCommand),
    /// Recent events of a device or sensor
    #[command(subcommand)]
    Logs(LogsCommand),
    /// Notifications sent to a user, newest first
    Notifications {
        #[arg(long)]
        user: UserId,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

#[derive(Subcommand)]
pub enum PlanCommand {
    /// Install a plan, replacing the current one
    Set {
        #[arg(long)]
        sensor: SensorId,
        /// Readings below this bound raise an alert
        #[arg(long)]
        lower: Option<f64>,
        /// Readings above this bound raise an alert
        #[arg(long)]
        upper: Option<f64>,
    },
    /// Show the active plan
    Show {
        #[arg(long)]
        sensor: SensorId,
    },
    /// Remove the active plan
    Remove {
        #[arg(long)]
        sensor: SensorId,
    },
}

#[derive(Subcommand)]
pub enum ScheduleCommand {
    /// Create a schedule
    Add(ScheduleArgs),
    /// Show one schedule
    Show {
        #[arg(long)]
        id: ScheduleId,
    },
    /// List the schedules of a device
    List {
        #[arg(long)]
        device: DeviceId,
    },
    /// Stop firing a schedule
    Pause {
        #[arg(long)]
        id: ScheduleId,
    },
    /// Fire a paused schedule again
    Resume {
        #[arg(long)]
        id: ScheduleId,
    },
    /// Delete a schedule
    Remove {
        #[arg(long)]
        id: ScheduleId,
    },
}

#[derive(Args)]
pub struct ScheduleArgs {
    #[arg(long)]
    pub device: DeviceId,
    /// User the schedule acts on behalf of
    #[arg(long)]
    pub user: UserId,
    /// Raw action value, translated for the device category when fired
    #[arg(long)]
    pub value: String,
    /// Local time of day (HH:MM or HH:MM:SS)
    #[arg(long)]
    pub at: String,
    /// Comma-separated weekdays (e.g. "Mon,Wed,Fri")
    #[arg(long, default_value = "Mon,Tue,Wed,Thu,Fri,Sat,Sun")]
    pub days: String,
    /// IANA timezone the time of day is expressed in
    #[arg(long, default_value = "UTC")]
    pub timezone: String,
}

#[derive(Subcommand)]
pub enum ReportCommand {
    /// Hours a device was on, per day
    Usage {
        #[arg(long)]
        device: DeviceId,
        #[command(flatten)]
        window: Window,
    },
    /// Hours summed over the devices of one category in a room, per day
    Room {
        #[arg(long)]
        room: RoomId,
        #[arg(long)]
        category: DeviceCategory,
        #[command(flatten)]
        window: Window,
    },
    /// Energy used by the metered devices of a room, in kWh
    Energy {
        #[arg(long)]
        room: RoomId,
        #[command(flatten)]
        window: Window,
    },
    /// Average sensor reading, per day
    Sensor {
        #[arg(long)]
        sensor: SensorId,
        #[command(flatten)]
        window: Window,
    },
}

#[derive(Subcommand)]
pub enum LogsCommand {
    /// Device events, by default over the last 7 days
    Device {
        #[arg(long)]
        device: DeviceId,
        #[arg(long, default_value_t = 168, value_parser = log_hours())]
        hours: u32,
    },
    /// Sensor events, by default over the last 7 hours
    Sensor {
        #[arg(long)]
        sensor: SensorId,
        #[arg(long, default_value_t = 7, value_parser = log_hours())]
        hours: u32,
    },
}

/// Up to a year of hours.
fn log_hours() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=8784)
}

/// Report window: the last `days` local days, today included.
#[derive(Args, Clone, Copy)]
pub struct Window {
    #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..=366))]
    pub days: u32,
}
