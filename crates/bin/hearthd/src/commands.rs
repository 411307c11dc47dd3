//! One-shot administration commands. Results are printed as JSON on stdout.

use std::io::Write;

use anyhow::Context;
use chrono::{Days, Duration};
use chrono_tz::Tz;
use hearth_app::ports::{DeviceRepository, SensorRepository};
use hearth_domain::event::Subject;
use hearth_domain::plan::Plan;
use hearth_domain::id::UserId;
use hearth_domain::schedule::{Schedule, parse_time_of_day};
use hearth_domain::time::{Timestamp, local_date, now, start_of_day};
use hearth_domain::usage::total_hours;
use serde::Serialize;
use serde_json::json;

use crate::cli::{LogsCommand, PlanCommand, ReportCommand, ScheduleArgs, ScheduleCommand, Window};
use crate::config::Config;
use crate::stores::Stores;

pub async fn inventory(stores: &Stores) -> anyhow::Result<()> {
    let devices = stores.devices.list_all().await?;
    let sensors = stores.sensors.list_all().await?;
    print_json(&json!({ "devices": devices, "sensors": sensors }))
}

pub async fn plan(stores: &Stores, command: PlanCommand) -> anyhow::Result<()> {
    let service = stores.plan_service();
    match command {
        PlanCommand::Set {
            sensor,
            lower,
            upper,
        } => {
            let plan = service.set_plan(Plan::new(sensor, lower, upper)).await?;
            print_json(&plan)
        }
        PlanCommand::Show { sensor } => print_json(&service.get_plan(sensor).await?),
        PlanCommand::Remove { sensor } => {
            service.remove_plan(sensor).await?;
            print_json(&json!({ "removed": sensor }))
        }
    }
}

pub async fn schedule(stores: &Stores, command: ScheduleCommand) -> anyhow::Result<()> {
    let service = stores.schedule_service();
    match command {
        ScheduleCommand::Add(args) => print_json(&service.create(build_schedule(&args)?).await?),
        ScheduleCommand::Show { id } => print_json(&service.get(id).await?),
        ScheduleCommand::List { device } => print_json(&service.list_for_device(device).await?),
        ScheduleCommand::Pause { id } => print_json(&service.set_active(id, false).await?),
        ScheduleCommand::Resume { id } => print_json(&service.set_active(id, true).await?),
        ScheduleCommand::Remove { id } => {
            service.remove(id).await?;
            print_json(&json!({ "removed": id }))
        }
    }
}

fn build_schedule(args: &ScheduleArgs) -> anyhow::Result<Schedule> {
    let schedule = Schedule::builder()
        .device_id(args.device)
        .user_id(args.user)
        .action_value(&args.value)
        .time_of_day(parse_time_of_day(&args.at)?)
        .repeat_days(args.days.parse()?)
        .timezone(&args.timezone)
        .build()?;
    Ok(schedule)
}

pub async fn report(
    config: &Config,
    stores: &Stores,
    command: ReportCommand,
) -> anyhow::Result<()> {
    let options = config.report_options()?;
    let service = stores.report_service(options);
    match command {
        ReportCommand::Usage { device, window } => {
            let (start, end) = window.bounds(options.timezone, now());
            let days = service.device_usage(device, start, end).await?;
            print_json(&json!({
                "device": device,
                "total_hours": total_hours(&days),
                "days": days,
            }))
        }
        ReportCommand::Room {
            room,
            category,
            window,
        } => {
            let (start, end) = window.bounds(options.timezone, now());
            let days = service.room_usage(room, category, start, end).await?;
            print_json(&json!({
                "room": room,
                "category": category,
                "total_hours": total_hours(&days),
                "days": days,
            }))
        }
        ReportCommand::Energy { room, window } => {
            let (start, end) = window.bounds(options.timezone, now());
            let kwh = service.room_energy(room, start, end).await?;
            print_json(&json!({ "room": room, "kwh": kwh }))
        }
        ReportCommand::Sensor { sensor, window } => {
            let (start, end) = window.bounds(options.timezone, now());
            let days = service.sensor_daily_average(sensor, start, end).await?;
            print_json(&json!({ "sensor": sensor, "days": days }))
        }
    }
}

pub async fn logs(config: &Config, stores: &Stores, command: LogsCommand) -> anyhow::Result<()> {
    let service = stores.report_service(config.report_options()?);
    let (subject, hours): (Subject, u32) = match command {
        LogsCommand::Device { device, hours } => (device.into(), hours),
        LogsCommand::Sensor { sensor, hours } => (sensor.into(), hours),
    };
    let events = service
        .recent_events(subject, Duration::hours(i64::from(hours)), now())
        .await?;
    print_json(&json!({ "subject": subject, "hours": hours, "events": events }))
}

pub async fn notifications(stores: &Stores, user: UserId, limit: u32) -> anyhow::Result<()> {
    let sent = stores.notifications.list_for_user(user, limit).await?;
    print_json(&json!({ "user": user, "notifications": sent }))
}

impl Window {
    /// `[first local midnight, next local midnight)` covering the last
    /// `days` days up to and including the day of `at`.
    fn bounds(self, tz: Tz, at: Timestamp) -> (Timestamp, Timestamp) {
        let today = local_date(at, tz);
        let first = today
            .checked_sub_days(Days::new(u64::from(self.days.saturating_sub(1))))
            .unwrap_or(today);
        let tomorrow = today.succ_opt().unwrap_or(today);
        (start_of_day(first, tz), start_of_day(tomorrow, tz))
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).context("failed to write output")?;
    writeln!(stdout)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use hearth_domain::id::DeviceId;

    #[test]
    fn should_cover_whole_local_days_up_to_today() {
        let at = Utc.with_ymd_and_hms(2025, 3, 12, 15, 0, 0).unwrap();
        let window = Window { days: 3 };

        let (start, end) = window.bounds(chrono_tz::UTC, at);

        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 13, 0, 0, 0).unwrap());
    }

    #[test]
    fn should_use_local_midnights() {
        // 20:00 UTC on the 11th is already the 12th in Saigon (UTC+7).
        let at = Utc.with_ymd_and_hms(2025, 3, 11, 20, 0, 0).unwrap();
        let window = Window { days: 1 };

        let (start, end) = window.bounds(chrono_tz::Asia::Ho_Chi_Minh, at);

        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 11, 17, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 12, 17, 0, 0).unwrap());
    }

    #[test]
    fn should_build_schedule_from_arguments() {
        let args = ScheduleArgs {
            device: DeviceId::new(),
            user: UserId::new(),
            value: "2".to_string(),
            at: "07:30".to_string(),
            days: "Mon,Wed,Fri".to_string(),
            timezone: "Asia/Ho_Chi_Minh".to_string(),
        };

        let schedule = build_schedule(&args).unwrap();

        assert_eq!(schedule.device_id, args.device);
        assert_eq!(schedule.repeat_days.to_string(), "Mon,Wed,Fri");
        assert!(schedule.active);
    }

    #[test]
    fn should_reject_schedule_with_bad_time() {
        let args = ScheduleArgs {
            device: DeviceId::new(),
            user: UserId::new(),
            value: "1".to_string(),
            at: "25:00".to_string(),
            days: "Mon".to_string(),
            timezone: "UTC".to_string(),
        };
        assert!(build_schedule(&args).is_err());
    }
}
