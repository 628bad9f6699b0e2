use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, NaiveTime, Weekday};
use garden_domain::{
    calendar::{shift_month, MonthGrid},
    notifications::{NotificationSink, PermissionStatus, ReminderOutcome, ReminderRequest},
    plant::{ImageBlob, NewPlant, PlantId},
    storage::FileStore,
    watering::{WateredMarks, DEFAULT_WATERED_MARK},
    GardenService,
};
use tracing::{info, warn};

use crate::cli::{AddArgs, Cli, Command};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) data_dir: PathBuf,
    pub(crate) week_start: Weekday,
    pub(crate) reminder_time: NaiveTime,
    pub(crate) watered_mark: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_lookup(|key| std::env::var(key).ok()))
    }

    /// Builds the config from `get`, keeping the default for blank or invalid values.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let lookup = |key: &str| {
            get(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        if let Some(dir) = lookup("GARDEN_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup("GARDEN_WEEK_START") {
            match value.parse::<Weekday>() {
                Ok(weekday) => config.week_start = weekday,
                Err(_) => warn!(%value, "ignoring unknown GARDEN_WEEK_START"),
            }
        }
        if let Some(value) = lookup("GARDEN_REMINDER_TIME") {
            match NaiveTime::parse_from_str(&value, "%H:%M") {
                Ok(time) => config.reminder_time = time,
                Err(err) => warn!(%value, %err, "ignoring invalid GARDEN_REMINDER_TIME"),
            }
        }
        if let Some(value) = lookup("GARDEN_WATERED_MARK") {
            config.watered_mark = value;
        }
        config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("garden-data"),
            week_start: Weekday::Sun,
            reminder_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            watered_mark: DEFAULT_WATERED_MARK.to_string(),
        }
    }
}

/// Stands in for the platform notification centre: reminders are logged.
#[derive(Debug, Default)]
pub struct LoggingNotificationSink;

impl NotificationSink for LoggingNotificationSink {
    fn request_authorization(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    fn schedule(&self, request: ReminderRequest) {
        info!(
            id = %request.id,
            at = %request.scheduled_for(),
            title = %request.title,
            "reminder scheduled"
        );
    }

    fn cancel(&self, id: &str) {
        info!(%id, "reminder cancelled");
    }
}

pub fn build_service(config: &AppConfig) -> GardenService {
    info!(path = %config.data_dir.display(), "opening garden");
    GardenService::builder()
        .with_storage(Box::new(FileStore::new(&config.data_dir)))
        .with_notification_sink(Box::new(LoggingNotificationSink))
        .week_start(config.week_start)
        .reminder_time(config.reminder_time)
        .watered_mark(config.watered_mark.clone())
        .build()
}

/// Opens the garden and re-issues every pending reminder, as the app does on launch.
pub fn start(config: &AppConfig) -> (GardenService, Vec<ReminderOutcome>) {
    let service = build_service(config);
    let reminders = service.reschedule_all();
    (service, reminders)
}

pub fn run(config: AppConfig, cli: Cli) -> Result<()> {
    let (mut service, reminders) = start(&config);
    let today = Local::now().date_naive();

    match cli.command {
        Command::List => print_plants(&service),
        Command::Add(args) => {
            let id = add_plant(&mut service, args, today)?;
            println!("Added plant {id}");
        }
        Command::AddImage { id, image } => {
            let id: PlantId = id.parse().with_context(|| format!("invalid plant id `{id}`"))?;
            let blob = read_image(&image)?;
            service
                .add_image(id, blob)
                .context("failed to add image")?;
            println!("Image added");
        }
        Command::Remove { positions } => {
            let indices = positions_to_indices(&positions)?;
            let removed = service
                .delete_plants(&indices)
                .context("failed to remove plants")?;
            println!("Removed {removed} plant(s)");
        }
        Command::Calendar { date, offset } => {
            let reference = shift_month(date.unwrap_or(today), offset);
            let grid = service.calendar(reference);
            print!("{}", render_month(&grid, service.watered_marks()));
        }
        Command::Water { date } => {
            let date = date.unwrap_or(today);
            service
                .mark_watered(date)
                .context("failed to record watering")?;
            println!("Marked {date} as watered");
        }
        Command::Unwater { date } => {
            match service
                .unmark_watered(date)
                .context("failed to clear watering")?
            {
                Some(_) => println!("Cleared {date}"),
                None => println!("{date} was not marked"),
            }
        }
        Command::Reminders => {
            for outcome in reminders {
                match outcome {
                    ReminderOutcome::Scheduled(request) => {
                        println!("{}  {}", request.scheduled_for(), request.title)
                    }
                    ReminderOutcome::PermissionDenied => {
                        println!("Notifications are not allowed");
                        break;
                    }
                    ReminderOutcome::NoSink => {}
                }
            }
        }
    }
    Ok(())
}

fn add_plant(service: &mut GardenService, args: AddArgs, today: NaiveDate) -> Result<PlantId> {
    let mut form = NewPlant::new(args.name)
        .with_description(args.description)
        .with_frequency(args.frequency);
    if let Some(path) = &args.image {
        form = form.with_image(read_image(path)?);
    }
    let added = service
        .add_plant(form, args.watered_on.unwrap_or(today))
        .context("failed to add plant")?;
    Ok(added.id)
}

fn read_image(path: &Path) -> Result<ImageBlob> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read image {}", path.display()))?;
    Ok(ImageBlob::new(bytes))
}

fn positions_to_indices(positions: &[usize]) -> Result<Vec<usize>> {
    positions
        .iter()
        .map(|position| match position.checked_sub(1) {
            Some(idx) => Ok(idx),
            None => bail!("positions start at 1"),
        })
        .collect()
}

fn print_plants(service: &GardenService) {
    if service.plants().is_empty() {
        println!("Your garden is empty 🌱");
        return;
    }
    for (idx, plant) in service.plants().iter().enumerate() {
        println!(
            "{:>2}. {} [{}]\n    {}\n    every {} day(s), next watering {}, {} photo(s)",
            idx + 1,
            plant.name,
            plant.id,
            plant.description,
            plant.watering_frequency_days,
            plant.next_watering().format("%b %e, %Y"),
            plant.images.len()
        );
    }
}

pub fn render_month(grid: &MonthGrid, marks: &WateredMarks) -> String {
    let mut out = format!("{}\n", grid.title());
    let headers: Vec<String> = grid
        .weekday_headers()
        .iter()
        .map(|weekday| format!("{:>4}", weekday.to_string()))
        .collect();
    out.push_str(&headers.concat());
    out.push('\n');
    for week in grid.weeks() {
        for cell in week {
            let label = marks.label_for(cell);
            if cell.in_current_month {
                out.push_str(&format!("{label:>4}"));
            } else {
                out.push_str(&format!("{:>4}", format!("({label})")));
            }
        }
        out.push('\n');
    }
    out
}
