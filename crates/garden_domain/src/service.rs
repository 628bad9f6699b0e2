use chrono::{NaiveDate, NaiveTime, Weekday};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::{
    calendar::{CalendarGridBuilder, MonthGrid},
    notifications::{NotificationSink, PermissionStatus, ReminderOutcome, ReminderRequest},
    plant::{ImageBlob, NewPlant, Plant, PlantError, PlantId},
    storage::{KeyValueStore, MemoryStore},
    store::{load_slot, save_slot, PlantStore, StoreError},
    watering::{reminder_id, WateredMarks, WateringScheduler, DEFAULT_WATERED_MARK},
};

pub const WATERED_DAYS_KEY: &str = "watered_days";

#[derive(Debug, Error)]
pub enum GardenError {
    #[error(transparent)]
    Plant(#[from] PlantError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedPlant {
    pub id: PlantId,
    pub reminder: ReminderOutcome,
}

pub struct GardenService {
    store: PlantStore<Box<dyn KeyValueStore>>,
    marks: WateredMarks,
    calendar: CalendarGridBuilder,
    scheduler: WateringScheduler,
    watered_mark: String,
    notification_sink: Option<Box<dyn NotificationSink>>,
    permission: Option<PermissionStatus>,
}

pub struct GardenServiceBuilder {
    storage: Option<Box<dyn KeyValueStore>>,
    notification_sink: Option<Box<dyn NotificationSink>>,
    week_start: Weekday,
    reminder_time: NaiveTime,
    watered_mark: String,
}

impl Default for GardenServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GardenServiceBuilder {
    pub fn new() -> Self {
        Self {
            storage: None,
            notification_sink: None,
            week_start: Weekday::Sun,
            reminder_time: WateringScheduler::default().reminder_time(),
            watered_mark: DEFAULT_WATERED_MARK.to_string(),
        }
    }

    pub fn with_storage(mut self, storage: Box<dyn KeyValueStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_notification_sink(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.notification_sink = Some(sink);
        self
    }

    pub fn week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    pub fn reminder_time(mut self, time: NaiveTime) -> Self {
        self.reminder_time = time;
        self
    }

    pub fn watered_mark(mut self, symbol: impl Into<String>) -> Self {
        self.watered_mark = symbol.into();
        self
    }

    /// Loads both snapshots and asks the sink for permission once.
    pub fn build(self) -> GardenService {
        let storage = self
            .storage
            .unwrap_or_else(|| Box::new(MemoryStore::new()));
        let marks = match load_slot::<WateredMarks, _>(&storage, WATERED_DAYS_KEY) {
            Ok(marks) => marks.unwrap_or_default(),
            Err(err) => {
                warn!(%err, "discarding unreadable watered days");
                WateredMarks::new()
            }
        };
        let store = PlantStore::open(storage);
        let permission = self
            .notification_sink
            .as_ref()
            .map(|sink| sink.request_authorization());
        if permission == Some(PermissionStatus::Denied) {
            warn!("notification permission denied; reminders will not be scheduled");
        }
        info!(
            plants = store.len(),
            watered_days = marks.len(),
            "garden service ready"
        );
        GardenService {
            store,
            marks,
            calendar: CalendarGridBuilder::new(self.week_start),
            scheduler: WateringScheduler::new(self.reminder_time),
            watered_mark: self.watered_mark,
            notification_sink: self.notification_sink,
            permission,
        }
    }
}

impl GardenService {
    pub fn builder() -> GardenServiceBuilder {
        GardenServiceBuilder::new()
    }

    pub fn plants(&self) -> &[Plant] {
        self.store.plants()
    }

    pub fn plant(&self, id: PlantId) -> Option<&Plant> {
        self.store.get(id)
    }

    pub fn permission(&self) -> Option<PermissionStatus> {
        self.permission
    }

    pub fn watered_marks(&self) -> &WateredMarks {
        &self.marks
    }

    pub fn calendar(&self, reference: NaiveDate) -> MonthGrid {
        self.calendar.build(reference)
    }

    pub fn next_reminder(&self, id: PlantId) -> Option<ReminderRequest> {
        self.store
            .get(id)
            .map(|plant| self.scheduler.next_reminder(plant))
    }

    /// Creates a plant watered on `watered_on` and schedules its reminder.
    ///
    /// When the snapshot cannot be written the plant is still listed and
    /// scheduled for this session; the store error is returned.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub fn add_plant(
        &mut self,
        new: NewPlant,
        watered_on: NaiveDate,
    ) -> Result<AddedPlant, GardenError> {
        let plant = new.into_plant(watered_on)?;
        let id = plant.id;
        let reminder = self.schedule_reminder(&plant);
        let persisted = self.store.append(plant);
        info!(plant_id = %id, "plant added");
        persisted?;
        Ok(AddedPlant { id, reminder })
    }

    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub fn add_image(&mut self, id: PlantId, image: ImageBlob) -> Result<(), GardenError> {
        self.store.update_images(id, image)?;
        Ok(())
    }

    /// Deletes the plants at the given list positions and cancels their reminders.
    #[instrument(skip(self))]
    pub fn delete_plants(&mut self, indices: &[usize]) -> Result<usize, GardenError> {
        let doomed: Vec<String> = indices
            .iter()
            .filter_map(|idx| self.store.plants().get(*idx))
            .map(reminder_id)
            .collect();
        let removed = self.store.remove_at(indices);
        if let Some(sink) = &self.notification_sink {
            for id in &doomed {
                sink.cancel(id);
            }
        }
        Ok(removed?)
    }

    pub fn delete_plant(&mut self, id: PlantId) -> Result<(), GardenError> {
        let idx = self.store.position(id).ok_or(PlantError::UnknownPlant(id))?;
        self.delete_plants(&[idx])?;
        Ok(())
    }

    /// Re-issues one reminder per plant. Ids are stable, so pending ones are replaced.
    pub fn reschedule_all(&self) -> Vec<ReminderOutcome> {
        let outcomes: Vec<ReminderOutcome> = self
            .store
            .plants()
            .iter()
            .map(|plant| self.schedule_reminder(plant))
            .collect();
        info!(count = outcomes.len(), "rescheduled reminders");
        outcomes
    }

    /// Records that the plants were watered on `date`.
    // TODO: decide whether confirming a day should also move each plant's
    // `last_watered` forward and reschedule; today reminders keep counting
    // from the creation date.
    #[instrument(skip(self))]
    pub fn mark_watered(&mut self, date: NaiveDate) -> Result<(), GardenError> {
        self.marks.mark(date, self.watered_mark.clone());
        self.persist_marks()
    }

    #[instrument(skip(self))]
    pub fn unmark_watered(&mut self, date: NaiveDate) -> Result<Option<String>, GardenError> {
        let removed = self.marks.unmark(date);
        if removed.is_some() {
            self.persist_marks()?;
        }
        Ok(removed)
    }

    fn schedule_reminder(&self, plant: &Plant) -> ReminderOutcome {
        let Some(sink) = &self.notification_sink else {
            return ReminderOutcome::NoSink;
        };
        if self.permission == Some(PermissionStatus::Denied) {
            debug!(plant_id = %plant.id, "skipping reminder without permission");
            return ReminderOutcome::PermissionDenied;
        }
        let request = self.scheduler.next_reminder(plant);
        debug!(plant_id = %plant.id, fire_date = %request.fire_date, "scheduling reminder");
        sink.schedule(request.clone());
        ReminderOutcome::Scheduled(request)
    }

    fn persist_marks(&self) -> Result<(), GardenError> {
        save_slot(self.store.storage(), WATERED_DAYS_KEY, &self.marks).map_err(|err| {
            warn!(%err, "watered days not persisted; previous snapshot kept");
            GardenError::from(err)
        })
    }
}
