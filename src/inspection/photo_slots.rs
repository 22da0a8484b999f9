//! Photo-to-slot assignment.
//!
//! Uploaded photos live in a bounded pool. Each photo is either unassigned or sits in
//! exactly one named capture slot; moving a photo always removes it from its previous
//! slot before inserting it into the new one.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use super::error::ValidationError;
use super::types::{PhotoRef, ProductCategory};

/// Upper bound on uploaded photos per session.
pub const DEFAULT_MAX_PHOTOS: usize = 20;

/// Prefix of slot ids generated from special photography requests.
pub const SPECIAL_SLOT_PREFIX: &str = "special_";

/// Labels for special photography requests recorded on the delivery plan.
const SPECIAL_REQUEST_LABELS: &[(&str, &str)] = &[
    ("diagonal_30", "Diagonal view (30°)"),
    ("diagonal_45", "Diagonal view (45°)"),
    ("closeup", "Close-up detail"),
    ("functional_details", "Functional details"),
    ("box_contents", "Box and included accessories"),
    ("serial_number", "Serial number plate"),
    ("scratch_detail", "Scratch and wear detail"),
    ("lens_glass", "Lens glass against light"),
    ("top_view", "Top view"),
    ("bottom_view", "Bottom view"),
];

/// A named capture target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSlot {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub photos: Vec<PhotoRef>,
}

impl PhotoSlot {
    pub fn new(id: impl Into<String>, label: impl Into<String>, required: bool) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            required,
            photos: Vec::new(),
        }
    }

    pub fn is_filled(&self) -> bool {
        !self.photos.is_empty()
    }
}

/// Human label for a special request id, falling back to the raw id.
pub fn special_request_label(request_id: &str) -> String {
    SPECIAL_REQUEST_LABELS
        .iter()
        .find(|(id, _)| *id == request_id)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| request_id.to_string())
}

/// Capture slots shown for a category before any special requests are added.
pub fn default_slots(category: &ProductCategory) -> Vec<PhotoSlot> {
    let preset: &[(&str, &str)] = match category {
        ProductCategory::Camera => &[
            ("front", "Front"),
            ("back", "Back"),
            ("top", "Top"),
            ("mount", "Mount"),
            ("sensor", "Sensor"),
            ("lcd", "LCD screen"),
        ],
        ProductCategory::Lens => &[
            ("front", "Front"),
            ("side", "Side"),
            ("mount", "Mount"),
            ("front_element", "Front element"),
            ("rear_element", "Rear element"),
            ("aperture", "Aperture blades"),
        ],
        ProductCategory::Watch => &[
            ("front", "Dial"),
            ("caseback", "Caseback"),
            ("case_side", "Case side"),
            ("band", "Band"),
            ("buckle", "Buckle"),
        ],
        ProductCategory::Accessory | ProductCategory::Other(_) => &[
            ("front", "Front"),
            ("back", "Back"),
            ("detail", "Detail"),
        ],
    };

    preset
        .iter()
        .map(|(id, label)| PhotoSlot::new(*id, *label, *id == "front"))
        .collect()
}

/// Result of an upload batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadOutcome {
    pub accepted: usize,
    /// Photos dropped because the pool was full.
    pub rejected: usize,
    /// Photos already present in the pool.
    pub duplicates: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoSlotAssigner {
    photos: Vec<PhotoRef>,
    slots: Vec<PhotoSlot>,
    max_photos: usize,
}

impl PhotoSlotAssigner {
    pub fn new(slots: Vec<PhotoSlot>, max_photos: usize) -> Self {
        Self {
            photos: Vec::new(),
            slots,
            max_photos,
        }
    }

    /// Category preset followed by one required slot per special request.
    pub fn for_product(
        category: &ProductCategory,
        special_requests: &[String],
        max_photos: usize,
    ) -> Self {
        let mut slots = default_slots(category);
        for request in special_requests {
            let id = format!("{SPECIAL_SLOT_PREFIX}{request}");
            if slots.iter().any(|slot| slot.id == id) {
                continue;
            }
            slots.push(PhotoSlot::new(id, special_request_label(request), true));
        }
        Self::new(slots, max_photos)
    }

    pub fn photos(&self) -> &[PhotoRef] {
        &self.photos
    }

    pub fn slots(&self) -> &[PhotoSlot] {
        &self.slots
    }

    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }

    pub fn max_photos(&self) -> usize {
        self.max_photos
    }

    pub fn upload<I>(&mut self, photos: I) -> UploadOutcome
    where
        I: IntoIterator<Item = PhotoRef>,
    {
        let mut outcome = UploadOutcome::default();
        for photo in photos {
            if self.photos.contains(&photo) {
                outcome.duplicates += 1;
            } else if self.photos.len() >= self.max_photos {
                outcome.rejected += 1;
            } else {
                self.photos.push(photo);
                outcome.accepted += 1;
            }
        }
        if outcome.rejected > 0 {
            debug!(
                accepted = outcome.accepted,
                rejected = outcome.rejected,
                max_photos = self.max_photos,
                "Photo upload truncated at pool capacity"
            );
        }
        outcome
    }

    /// Moves `photo` into `slot_id`. Assigning to the slot that already holds it is a no-op.
    pub fn assign(&mut self, photo: &PhotoRef, slot_id: &str) -> Result<(), ValidationError> {
        if !self.photos.contains(photo) {
            return Err(ValidationError::UnknownPhoto {
                photo: photo.to_string(),
            });
        }
        if !self.slots.iter().any(|slot| slot.id == slot_id) {
            return Err(ValidationError::UnknownSlot {
                slot_id: slot_id.to_string(),
            });
        }
        if self.slot_of(photo) == Some(slot_id) {
            return Ok(());
        }

        self.unassign(photo);
        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.id == slot_id) {
            slot.photos.push(photo.clone());
        }
        Ok(())
    }

    /// Returns the id of the slot the photo was taken out of, if any.
    pub fn unassign(&mut self, photo: &PhotoRef) -> Option<String> {
        let mut left = None;
        for slot in &mut self.slots {
            let before = slot.photos.len();
            slot.photos.retain(|p| p != photo);
            if slot.photos.len() != before && left.is_none() {
                left = Some(slot.id.clone());
            }
        }
        left
    }

    /// Deletes the photo from every slot and from the pool.
    pub fn remove_photo(&mut self, photo: &PhotoRef) -> bool {
        self.unassign(photo);
        let before = self.photos.len();
        self.photos.retain(|p| p != photo);
        before != self.photos.len()
    }

    pub fn slot_of(&self, photo: &PhotoRef) -> Option<&str> {
        self.slots
            .iter()
            .find(|slot| slot.photos.contains(photo))
            .map(|slot| slot.id.as_str())
    }

    /// Uploaded photos not sitting in any slot, in upload order.
    pub fn unassigned(&self) -> Vec<&PhotoRef> {
        let slotted: HashSet<&PhotoRef> = self
            .slots
            .iter()
            .flat_map(|slot| slot.photos.iter())
            .collect();
        self.photos
            .iter()
            .filter(|photo| !slotted.contains(photo))
            .collect()
    }

    pub fn is_satisfied(&self) -> bool {
        self.slots
            .iter()
            .all(|slot| !slot.required || slot.is_filled())
    }

    pub fn unsatisfied_slots(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter(|slot| slot.required && !slot.is_filled())
            .map(|slot| slot.id.as_str())
            .collect()
    }

    /// Photography was explicitly skipped: no slot may block completion.
    pub fn waive_required(&mut self) {
        for slot in &mut self.slots {
            slot.required = false;
        }
    }

    /// Rehydrates pool and slot contents from a checkpoint.
    ///
    /// Persisted slots matching a generated slot id refill it; unknown persisted slots
    /// are appended. References to photos outside the pool are dropped, and a photo
    /// listed in several slots stays in the first one.
    pub fn restore(&mut self, photos: Vec<PhotoRef>, slots: Vec<PhotoSlot>) {
        self.photos.clear();
        for slot in &mut self.slots {
            slot.photos.clear();
        }
        let outcome = self.upload(photos);
        if outcome.rejected > 0 || outcome.duplicates > 0 {
            debug!(
                rejected = outcome.rejected,
                duplicates = outcome.duplicates,
                "Checkpoint photo list trimmed during restore"
            );
        }

        let mut placed: HashSet<PhotoRef> = HashSet::new();
        for persisted in slots {
            let contents: Vec<PhotoRef> = persisted
                .photos
                .iter()
                .filter(|photo| self.photos.contains(*photo) && !placed.contains(*photo))
                .cloned()
                .collect();
            placed.extend(contents.iter().cloned());

            match self.slots.iter_mut().find(|slot| slot.id == persisted.id) {
                Some(slot) => slot.photos = contents,
                None => self.slots.push(PhotoSlot {
                    photos: contents,
                    ..persisted
                }),
            }
        }
    }
}
