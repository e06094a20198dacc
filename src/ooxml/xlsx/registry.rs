//! Ordered, uniquely named sheets of a workbook.
//!
//! Sheets live in an arena indexed by [`SheetId`]; the tab order and the
//! name lookup refer to sheets by id, so renaming only touches the name
//! index and the sheet itself.

use std::collections::HashMap;

use tracing::debug;

use super::sheet::{Sheet, SheetId, SheetSource, SheetState};
use crate::common::{Error, Result};
use crate::models::ExcelProperties;

/// Longest sheet name spreadsheet applications accept.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const FORBIDDEN_NAME_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

#[derive(Debug, Clone, Default)]
pub struct SheetRegistry {
    sheets: Vec<Sheet>,
    order: Vec<SheetId>,
    by_name: HashMap<String, SheetId>,
    active: Option<SheetId>,
}

impl SheetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new, empty sheet.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateName`] if a sheet is already called `name` (exact,
    /// case-sensitive match); [`Error::InvalidOperation`] if `name` is not a
    /// valid sheet name.
    pub fn add_sheet(&mut self, name: &str) -> Result<&mut Sheet> {
        self.check_new_name(name)?;
        let id = SheetId(self.sheets.len());
        self.sheets.push(Sheet::new(id, name.to_string()));
        self.attach(id, name.to_string());
        debug!(sheet = name, position = self.order.len() - 1, "added sheet");
        Ok(&mut self.sheets[id.0])
    }

    /// Append a sheet named `SheetN` for the lowest free `N`.
    pub fn add_default_sheet(&mut self) -> Result<&mut Sheet> {
        let name = (1..)
            .map(|n| format!("Sheet{}", n))
            .find(|name| !self.by_name.contains_key(name))
            .ok_or_else(|| Error::InvalidOperation("no free default sheet name".to_string()))?;
        self.add_sheet(&name)
    }

    /// Register a sheet read from a package.
    pub(crate) fn insert_loaded(
        &mut self,
        name: String,
        state: SheetState,
        properties: Option<ExcelProperties>,
        source: SheetSource,
    ) -> Result<SheetId> {
        if self.by_name.contains_key(&name) {
            return Err(Error::DuplicateName(name));
        }
        let id = SheetId(self.sheets.len());
        self.sheets
            .push(Sheet::loaded(id, name.clone(), state, properties, source));
        self.by_name.insert(name.clone(), id);
        self.order.push(id);
        Ok(id)
    }

    /// Rename a sheet in place; its identity and position are kept.
    ///
    /// Renaming a sheet to its current name succeeds without change. On
    /// error nothing is modified.
    pub fn rename_sheet(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        let id = self.id_of(old_name)?;
        if old_name == new_name {
            return Ok(());
        }
        self.check_new_name(new_name)?;

        self.by_name.remove(old_name);
        self.by_name.insert(new_name.to_string(), id);
        self.sheets[id.0].set_name(new_name.to_string());
        debug!(from = old_name, to = new_name, "renamed sheet");
        Ok(())
    }

    pub fn get_sheet(&self, name: &str) -> Result<&Sheet> {
        let id = self.id_of(name)?;
        Ok(&self.sheets[id.0])
    }

    pub fn get_sheet_mut(&mut self, name: &str) -> Result<&mut Sheet> {
        let id = self.id_of(name)?;
        Ok(&mut self.sheets[id.0])
    }

    pub fn sheet(&self, id: SheetId) -> Option<&Sheet> {
        self.sheets.get(id.0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Sheet names in tab order.
    pub fn list_sheet_names(&self) -> Vec<String> {
        self.iter().map(|sheet| sheet.name().to_string()).collect()
    }

    /// Sheets in tab order.
    pub fn iter(&self) -> impl Iterator<Item = &Sheet> {
        self.order.iter().map(|id| &self.sheets[id.0])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Tab position of the sheet called `name`.
    pub fn position(&self, name: &str) -> Result<usize> {
        let id = self.id_of(name)?;
        self.order
            .iter()
            .position(|&other| other == id)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// The sheet shown when the workbook is opened.
    pub fn active_sheet(&self) -> Option<&Sheet> {
        self.active.and_then(|id| self.sheet(id))
    }

    /// Tab position of the active sheet.
    pub fn active_position(&self) -> Option<usize> {
        let active = self.active?;
        self.order.iter().position(|&id| id == active)
    }

    /// Make `name` the active sheet. Hidden sheets cannot be active.
    pub fn set_active_sheet(&mut self, name: &str) -> Result<()> {
        let id = self.id_of(name)?;
        if !self.sheets[id.0].is_visible() {
            return Err(Error::InvalidOperation(format!(
                "hidden sheet {:?} cannot be the active sheet",
                name
            )));
        }
        self.active = Some(id);
        debug!(sheet = name, "activated sheet");
        Ok(())
    }

    /// Restore the active sheet recorded in a package, falling back to the
    /// first visible sheet when the recorded tab is out of range or hidden.
    pub(crate) fn restore_active(&mut self, position: usize) {
        self.active = self
            .order
            .get(position)
            .copied()
            .filter(|id| self.sheets[id.0].is_visible())
            .or_else(|| self.first_visible_after(0));
    }

    pub fn hide_sheet(&mut self, name: &str) -> Result<()> {
        self.set_sheet_state(name, SheetState::Hidden)
    }

    pub fn unhide_sheet(&mut self, name: &str) -> Result<()> {
        self.set_sheet_state(name, SheetState::Visible)
    }

    /// Change a sheet's visibility.
    ///
    /// At least one sheet must stay visible. Hiding the active sheet makes
    /// the next visible sheet active.
    pub fn set_sheet_state(&mut self, name: &str, state: SheetState) -> Result<()> {
        let id = self.id_of(name)?;
        if !state.is_visible() && self.sheets[id.0].is_visible() {
            let others_visible = self
                .iter()
                .any(|sheet| sheet.id() != id && sheet.is_visible());
            if !others_visible {
                return Err(Error::InvalidOperation(format!(
                    "cannot hide {:?}, the only visible sheet",
                    name
                )));
            }
        }

        self.sheets[id.0].set_state(state);
        if state.is_visible() {
            if self.active.is_none() {
                self.active = Some(id);
            }
        } else if self.active == Some(id) {
            let position = self.order.iter().position(|&other| other == id).unwrap_or(0);
            self.active = self.first_visible_after(position + 1);
        }
        debug!(sheet = name, state = state.as_xml(), "changed sheet state");
        Ok(())
    }

    fn attach(&mut self, id: SheetId, name: String) {
        self.by_name.insert(name, id);
        self.order.push(id);
        if self.active.is_none() {
            self.active = Some(id);
        }
    }

    /// First visible sheet at or after tab `start`, wrapping around.
    fn first_visible_after(&self, start: usize) -> Option<SheetId> {
        let len = self.order.len();
        (0..len)
            .map(|offset| self.order[(start + offset) % len])
            .find(|id| self.sheets[id.0].is_visible())
    }

    fn id_of(&self, name: &str) -> Result<SheetId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::NotFound(format!("sheet {:?}", name)))
    }

    fn check_new_name(&self, name: &str) -> Result<()> {
        if self.by_name.contains_key(name) {
            return Err(Error::DuplicateName(name.to_string()));
        }
        validate_sheet_name(name)
    }
}

/// Check the naming rules spreadsheet applications enforce.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| Err(Error::InvalidOperation(format!("sheet name {:?} {}", name, reason)));

    if name.trim().is_empty() {
        return invalid("is empty");
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return invalid("is longer than 31 characters");
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
        return invalid(&format!("contains {:?}", c));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return invalid("starts or ends with an apostrophe");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn registry(names: &[&str]) -> SheetRegistry {
        let mut registry = SheetRegistry::new();
        for name in names {
            registry.add_sheet(name).unwrap();
        }
        registry
    }

    #[test]
    fn test_duplicate_add_leaves_count_unchanged() {
        let mut registry = registry(&["Sheet1"]);
        registry.add_sheet("Q1").unwrap();
        let err = registry.add_sheet("Q1").unwrap_err();
        assert!(matches!(err, Error::DuplicateName(ref n) if n == "Q1"));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.list_sheet_names(), vec!["Sheet1", "Q1"]);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut registry = registry(&["Q1"]);
        registry.add_sheet("q1").unwrap();
        assert_eq!(registry.list_sheet_names(), vec!["Q1", "q1"]);
        assert!(registry.get_sheet("Q1").unwrap().id() != registry.get_sheet("q1").unwrap().id());
    }

    #[test]
    fn test_rename_keeps_identity_and_position() {
        let mut registry = registry(&["A", "Q1", "C"]);
        let id = registry.get_sheet("Q1").unwrap().id();

        registry.rename_sheet("Q1", "Q2").unwrap();
        assert_eq!(registry.list_sheet_names(), vec!["A", "Q2", "C"]);
        assert_eq!(registry.get_sheet("Q2").unwrap().id(), id);
        assert!(matches!(registry.get_sheet("Q1"), Err(Error::NotFound(_))));
        assert_eq!(registry.position("Q2").unwrap(), 1);
    }

    #[test]
    fn test_failed_rename_changes_nothing() {
        let mut registry = registry(&["Q1", "Other"]);
        registry.rename_sheet("Q1", "Q2").unwrap();

        assert!(matches!(registry.rename_sheet("Bad", "X"), Err(Error::NotFound(_))));
        assert!(matches!(
            registry.rename_sheet("Q2", "Other"),
            Err(Error::DuplicateName(_))
        ));
        assert!(matches!(
            registry.rename_sheet("Q2", "a/b"),
            Err(Error::InvalidOperation(_))
        ));
        assert_eq!(registry.list_sheet_names(), vec!["Q2", "Other"]);
        assert!(registry.contains("Q2"));
        assert!(!registry.contains("X"));
    }

    #[test]
    fn test_rename_to_same_name_is_noop() {
        let mut registry = registry(&["Q1"]);
        registry.rename_sheet("Q1", "Q1").unwrap();
        assert_eq!(registry.list_sheet_names(), vec!["Q1"]);
    }

    #[test]
    fn test_default_sheet_names() {
        let mut registry = registry(&["Sheet1", "Sheet3"]);
        assert_eq!(registry.add_default_sheet().unwrap().name(), "Sheet2");
        assert_eq!(registry.add_default_sheet().unwrap().name(), "Sheet4");
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "   ", "a[1]", "what?", "'quoted", &"x".repeat(32)] {
            assert!(
                matches!(validate_sheet_name(name), Err(Error::InvalidOperation(_))),
                "{:?}",
                name
            );
        }
        validate_sheet_name(&"x".repeat(31)).unwrap();
        validate_sheet_name("Résumé 2024").unwrap();
    }

    #[test]
    fn test_first_sheet_becomes_active() {
        let mut registry = SheetRegistry::new();
        assert!(registry.active_sheet().is_none());
        registry.add_sheet("First").unwrap();
        registry.add_sheet("Second").unwrap();
        assert_eq!(registry.active_sheet().unwrap().name(), "First");

        registry.set_active_sheet("Second").unwrap();
        assert_eq!(registry.active_position(), Some(1));
    }

    #[test]
    fn test_hide_rules() {
        let mut registry = registry(&["A", "B", "C"]);
        registry.set_active_sheet("B").unwrap();

        registry.hide_sheet("B").unwrap();
        assert_eq!(registry.active_sheet().unwrap().name(), "C");
        assert!(matches!(
            registry.set_active_sheet("B"),
            Err(Error::InvalidOperation(_))
        ));

        registry.set_sheet_state("C", SheetState::VeryHidden).unwrap();
        assert_eq!(registry.active_sheet().unwrap().name(), "A");
        assert!(matches!(registry.hide_sheet("A"), Err(Error::InvalidOperation(_))));
        assert!(registry.get_sheet("A").unwrap().is_visible());

        registry.unhide_sheet("B").unwrap();
        registry.hide_sheet("A").unwrap();
        assert_eq!(registry.active_sheet().unwrap().name(), "B");
    }

    #[test]
    fn test_hiding_hidden_sheet_is_allowed() {
        let mut registry = registry(&["A", "B"]);
        registry.hide_sheet("B").unwrap();
        registry.set_sheet_state("B", SheetState::VeryHidden).unwrap();
        assert_eq!(registry.get_sheet("B").unwrap().state(), SheetState::VeryHidden);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(u8),
        Rename(u8, u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..8).prop_map(Op::Add),
            (0u8..8, 0u8..8).prop_map(|(a, b)| Op::Rename(a, b)),
        ]
    }

    proptest! {
        #[test]
        fn names_stay_unique_and_ids_stable(ops in prop::collection::vec(op(), 0..40)) {
            let mut registry = SheetRegistry::new();
            for op in ops {
                let before = registry.list_sheet_names();
                let ids: Vec<SheetId> = registry.iter().map(Sheet::id).collect();
                match op {
                    Op::Add(n) => {
                        let result = registry.add_sheet(&format!("S{}", n)).map(|_| ());
                        if result.is_err() {
                            prop_assert_eq!(registry.list_sheet_names(), before);
                        }
                    },
                    Op::Rename(a, b) => {
                        let result = registry.rename_sheet(&format!("S{}", a), &format!("S{}", b));
                        if result.is_err() {
                            prop_assert_eq!(registry.list_sheet_names(), before);
                        }
                        let after: Vec<SheetId> = registry.iter().map(Sheet::id).collect();
                        prop_assert_eq!(after, ids);
                    },
                }

                let names = registry.list_sheet_names();
                let mut unique = names.clone();
                unique.sort();
                unique.dedup();
                prop_assert_eq!(unique.len(), names.len());
                for name in &names {
                    prop_assert_eq!(registry.get_sheet(name).unwrap().name(), name.as_str());
                }
            }
        }
    }
}
