use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{calendar::CalendarCell, notifications::ReminderRequest, plant::Plant};

pub const DEFAULT_WATERED_MARK: &str = "💧";

/// Turns a plant's watering interval into its next reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WateringScheduler {
    reminder_time: NaiveTime,
}

impl Default for WateringScheduler {
    fn default() -> Self {
        Self::new(NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default())
    }
}

impl WateringScheduler {
    pub fn new(reminder_time: NaiveTime) -> Self {
        Self { reminder_time }
    }

    pub fn reminder_time(&self) -> NaiveTime {
        self.reminder_time
    }

    /// Input is expected to be validated already; this never fails.
    pub fn next_reminder(&self, plant: &Plant) -> ReminderRequest {
        ReminderRequest {
            id: reminder_id(plant),
            title: format!("Time to water 🌿 {}", plant.name),
            body: format!("Remember to water {} today!", plant.name),
            fire_date: plant.next_watering(),
            fire_time: self.reminder_time,
        }
    }
}

pub fn reminder_id(plant: &Plant) -> String {
    plant.id.to_string()
}

/// Days the user confirmed as watered, each with the symbol shown in its cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WateredMarks {
    marks: BTreeMap<NaiveDate, String>,
}

impl WateredMarks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, date: NaiveDate, symbol: impl Into<String>) {
        self.marks.insert(date, symbol.into());
    }

    pub fn unmark(&mut self, date: NaiveDate) -> Option<String> {
        self.marks.remove(&date)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&str> {
        self.marks.get(&date).map(String::as_str)
    }

    pub fn is_marked(&self, date: NaiveDate) -> bool {
        self.marks.contains_key(&date)
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &str)> {
        self.marks.iter().map(|(date, symbol)| (*date, symbol.as_str()))
    }

    /// Text for a grid cell: the mark when present, otherwise the day number.
    pub fn label_for(&self, cell: &CalendarCell) -> String {
        match self.get(cell.date) {
            Some(symbol) => symbol.to_string(),
            None => cell.date.day().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plant::NewPlant;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekly_plant_fires_seven_days_later() {
        let plant = NewPlant::new("Ficus")
            .with_frequency(7)
            .into_plant(date(2024, 1, 1))
            .unwrap();
        let scheduler = WateringScheduler::default();
        let request = scheduler.next_reminder(&plant);
        assert_eq!(request.fire_date, date(2024, 1, 8));
        assert_eq!(
            request.scheduled_for(),
            date(2024, 1, 8).and_hms_opt(9, 0, 0).unwrap()
        );
        assert_eq!(request.id, plant.id.to_string());
        assert_eq!(request.title, "Time to water 🌿 Ficus");
        assert_eq!(request.body, "Remember to water Ficus today!");
    }

    #[test]
    fn same_plant_yields_same_request() {
        let plant = NewPlant::new("Aloe")
            .with_frequency(30)
            .into_plant(date(2024, 2, 15))
            .unwrap();
        let scheduler = WateringScheduler::new(NaiveTime::from_hms_opt(18, 30, 0).unwrap());
        let first = scheduler.next_reminder(&plant);
        let second = scheduler.next_reminder(&plant.clone());
        assert_eq!(first, second);
        assert_eq!(first.fire_date, date(2024, 3, 16));
    }

    #[test]
    fn distinct_plants_get_distinct_ids() {
        let a = NewPlant::new("Pothos").into_plant(date(2024, 1, 1)).unwrap();
        let b = NewPlant::new("Pothos").into_plant(date(2024, 1, 1)).unwrap();
        assert_ne!(reminder_id(&a), reminder_id(&b));
    }

    #[test]
    fn marks_replace_day_labels() {
        let mut marks = WateredMarks::new();
        let watered = CalendarCell {
            date: date(2024, 3, 5),
            in_current_month: true,
        };
        let dry = CalendarCell {
            date: date(2024, 3, 6),
            in_current_month: true,
        };
        marks.mark(watered.date, DEFAULT_WATERED_MARK);
        assert_eq!(marks.label_for(&watered), "💧");
        assert_eq!(marks.label_for(&dry), "6");

        marks.mark(watered.date, "🌱");
        assert_eq!(marks.len(), 1);
        assert_eq!(marks.get(watered.date), Some("🌱"));
        assert_eq!(marks.unmark(watered.date).as_deref(), Some("🌱"));
        assert!(marks.is_empty());
    }

    #[test]
    fn marks_serialize_as_date_keyed_map() {
        let mut marks = WateredMarks::new();
        marks.mark(date(2024, 3, 5), "💧");
        let json = serde_json::to_string(&marks).unwrap();
        assert_eq!(json, r#"{"2024-03-05":"💧"}"#);
        let back: WateredMarks = serde_json::from_str(&json).unwrap();
        assert_eq!(back, marks);
    }
}
