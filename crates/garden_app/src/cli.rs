use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "garden")]
#[command(about = "Keep track of house plants and when to water them")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List plants with their next watering day
    List,
    /// Register a new plant and schedule its reminder
    Add(AddArgs),
    /// Append a photo to an existing plant
    AddImage {
        /// Plant id as shown by `list`
        #[arg(long)]
        id: String,
        /// Path to the image file
        #[arg(long)]
        image: PathBuf,
    },
    /// Remove plants by their position in `list` (starting at 1)
    Remove {
        #[arg(required = true)]
        positions: Vec<usize>,
    },
    /// Show a month grid with watered days marked
    Calendar {
        /// Any day of the month to show (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Months to move forward (or backward when negative)
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i32,
    },
    /// Confirm that the plants were watered on a day
    Water {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Clear the watered mark of a day
    Unwater {
        #[arg(long)]
        date: NaiveDate,
    },
    /// Re-issue the reminder of every plant
    Reminders,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Plant name
    #[arg(short = 'n', long = "name")]
    pub name: String,
    /// Free-form description
    #[arg(short = 'd', long = "description", default_value = "")]
    pub description: String,
    /// Watering interval in days (1 to 30)
    #[arg(short = 'f', long = "frequency", default_value_t = 1)]
    pub frequency: u32,
    /// Optional first photo
    #[arg(long)]
    pub image: Option<PathBuf>,
    /// Day the plant was last watered (defaults to today)
    #[arg(long)]
    pub watered_on: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_with_defaults() {
        let cli = Cli::try_parse_from(["garden", "add", "--name", "Fern"]).unwrap();
        let Command::Add(args) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(args.name, "Fern");
        assert_eq!(args.frequency, 1);
        assert!(args.watered_on.is_none());
    }

    #[test]
    fn parses_calendar_offset_and_date() {
        let cli = Cli::try_parse_from([
            "garden", "calendar", "--date", "2024-03-01", "--offset", "-2",
        ])
        .unwrap();
        match cli.command {
            Command::Calendar { date, offset } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 1));
                assert_eq!(offset, -2);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn remove_requires_positions() {
        assert!(Cli::try_parse_from(["garden", "remove"]).is_err());
        let cli = Cli::try_parse_from(["garden", "remove", "1", "3"]).unwrap();
        assert!(matches!(cli.command, Command::Remove { ref positions } if positions == &[1, 3]));
    }
}
