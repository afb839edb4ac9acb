use partdb_api::Project;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickerError {
    #[error("No project selected.")]
    NoProjectSelected,
}

/// Project list with at most one selected entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPicker {
    projects: Vec<String>,
    selected: Option<usize>,
}

impl ProjectPicker {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        let mut picker = Self::default();
        for name in names {
            picker.insert(name);
        }
        picker
    }

    pub fn from_projects(projects: &[Project]) -> Self {
        Self::new(projects.iter().map(|p| p.name.clone()))
    }

    pub fn projects(&self) -> &[String] {
        &self.projects
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selected.map(|i| self.projects[i].as_str())
    }

    pub fn select(&mut self, index: usize) {
        if index < self.projects.len() {
            self.selected = Some(index);
        }
    }

    pub fn select_next(&mut self) {
        if self.projects.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) => (i + 1).min(self.projects.len() - 1),
            None => 0,
        });
    }

    pub fn select_previous(&mut self) {
        if self.projects.is_empty() {
            return;
        }
        self.selected = Some(self.selected.map_or(0, |i| i.saturating_sub(1)));
    }

    fn insert(&mut self, name: String) -> bool {
        let name = name.trim().to_string();
        if name.is_empty() || self.projects.contains(&name) {
            return false;
        }
        self.projects.push(name);
        true
    }

    /// Append `name` and select it. Empty and duplicate names are ignored.
    pub fn add(&mut self, name: &str) -> bool {
        if !self.insert(name.to_string()) {
            return false;
        }
        self.selected = Some(self.projects.len() - 1);
        log::debug!("Added project '{}'", name.trim());
        true
    }

    pub fn push(&self) -> Result<&str, PickerError> {
        let name = self.selected_name().ok_or(PickerError::NoProjectSelected)?;
        log::info!("Pushing project: {name}");
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_from_server_projects() {
        let picker = ProjectPicker::from_projects(&[
            Project {
                id: 1,
                name: "Rev A".into(),
            },
            Project {
                id: 2,
                name: "Rev A".into(),
            },
            Project {
                id: 3,
                name: "".into(),
            },
        ]);
        assert_eq!(picker.projects(), ["Rev A"]);
        assert_eq!(picker.selected(), None);
    }

    #[test]
    fn add_rejects_empty_and_duplicates() {
        let mut picker = ProjectPicker::new(vec!["Rev A".to_string()]);
        assert!(!picker.add("   "));
        assert!(!picker.add("Rev A"));
        assert_eq!(picker.selected(), None);

        assert!(picker.add(" Rev B "));
        assert_eq!(picker.projects(), ["Rev A", "Rev B"]);
        assert_eq!(picker.push(), Ok("Rev B"));
    }

    #[test]
    fn push_requires_selection() {
        let mut picker = ProjectPicker::new(vec!["Rev A".to_string(), "Rev B".to_string()]);
        assert_eq!(picker.push(), Err(PickerError::NoProjectSelected));
        assert_eq!(
            PickerError::NoProjectSelected.to_string(),
            "No project selected."
        );

        picker.select_next();
        picker.select_next();
        picker.select_next();
        assert_eq!(picker.push(), Ok("Rev B"));
        picker.select_previous();
        assert_eq!(picker.push(), Ok("Rev A"));
        picker.select(7);
        assert_eq!(picker.selected(), Some(0));
    }

    #[test]
    fn empty_picker_never_selects() {
        let mut picker = ProjectPicker::default();
        picker.select_next();
        picker.select_previous();
        assert_eq!(picker.push(), Err(PickerError::NoProjectSelected));
    }
}
