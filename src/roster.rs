use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, RosterError};
use crate::paths::sibling;
use crate::student::{Student, StudentPatch};

pub const DEFAULT_DATA_PATH: &str = "data/students.json";

/// Optional inclusive bounds plus an exact (trimmed, case-insensitive) grade.
/// All present criteria must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentFilter {
    pub min_age: Option<i64>,
    pub max_age: Option<i64>,
    pub min_gpa: Option<f64>,
    pub max_gpa: Option<f64>,
    pub grade: Option<String>,
}

impl StudentFilter {
    pub fn matches(&self, s: &Student) -> bool {
        if self.min_age.is_some_and(|min| s.age < min) {
            return false;
        }
        if self.max_age.is_some_and(|max| s.age > max) {
            return false;
        }
        if self.min_gpa.is_some_and(|min| s.gpa < min) {
            return false;
        }
        if self.max_gpa.is_some_and(|max| s.gpa > max) {
            return false;
        }
        // A blank grade filter is treated as absent.
        if let Some(grade) = self.grade.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
            if s.grade.trim().to_lowercase() != grade.to_lowercase() {
                return false;
            }
        }
        true
    }

    /// Narrows an existing result set, e.g. the output of [`Roster::search`].
    pub fn apply(&self, students: Vec<Student>) -> Vec<Student> {
        students.into_iter().filter(|s| self.matches(s)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeCount {
    pub grade: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterStats {
    pub total: usize,
    pub average_age: Option<f64>,
    pub average_gpa: Option<f64>,
    pub by_grade: Vec<GradeCount>,
}

/// The student collection, mirrored to a JSON array file.
///
/// Every successful mutation rewrites the whole file before returning, so the
/// file always matches memory after the last successful call.
#[derive(Debug)]
pub struct Roster {
    path: PathBuf,
    students: Vec<Student>,
}

impl Roster {
    /// Opens the backing file, creating its directory and an empty `[]`
    /// document when missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| RosterError::io(parent, e))?;
        }
        if !path.exists() {
            info!(path = %path.display(), "creating empty roster file");
            write_atomic(&path, &[])?;
        }

        let students = load(&path)?;
        info!(path = %path.display(), count = students.len(), "roster loaded");
        Ok(Roster { path, students })
    }

    /// Re-reads the backing file, discarding in-memory state.
    pub fn reload(&mut self) -> Result<()> {
        self.students = load(&self.path)?;
        info!(path = %self.path.display(), count = self.students.len(), "roster reloaded");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn save(&self) -> Result<()> {
        write_atomic(&self.path, &self.students)?;
        debug!(path = %self.path.display(), count = self.students.len(), "roster saved");
        Ok(())
    }

    pub fn list_all(&self) -> Vec<Student> {
        self.students.clone()
    }

    /// Short token; uniqueness is only enforced on insert.
    pub fn generate_id() -> String {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(8);
        id
    }

    pub fn add(&mut self, mut data: Map<String, Value>) -> Result<Student> {
        let needs_id = match data.get("id") {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };
        if needs_id {
            data.insert("id".into(), Value::String(Self::generate_id()));
        }

        let student = Student::from_serializable(&data)?;
        student.validate()?;
        if self.find_by_id(&student.id).is_some() {
            return Err(RosterError::DuplicateId(student.id));
        }

        self.students.push(student.clone());
        if let Err(e) = self.save() {
            self.students.pop();
            return Err(e);
        }
        info!(id = %student.id, "student added");
        Ok(student)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    /// Applies `patch` to a copy and commits only if the copy validates, so a
    /// rejected update leaves both memory and disk untouched.
    pub fn update(&mut self, id: &str, patch: &StudentPatch) -> Result<Student> {
        let index = self
            .students
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| RosterError::NotFound(id.to_string()))?;

        let mut candidate = self.students[index].clone();
        patch.apply_to(&mut candidate);
        candidate.validate()?;

        let previous = std::mem::replace(&mut self.students[index], candidate.clone());
        if let Err(e) = self.save() {
            self.students[index] = previous;
            return Err(e);
        }
        info!(id = %id, "student updated");
        Ok(candidate)
    }

    /// Returns whether anything was removed; the file is only rewritten then.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        if !self.students.iter().any(|s| s.id == id) {
            return Ok(false);
        }

        let snapshot = self.students.clone();
        self.students.retain(|s| s.id != id);
        if let Err(e) = self.save() {
            self.students = snapshot;
            return Err(e);
        }
        info!(id = %id, "student deleted");
        Ok(true)
    }

    /// Case-insensitive substring match on id, name, grade and notes.
    /// A blank query returns everything.
    pub fn search(&self, query: &str) -> Vec<Student> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return self.list_all();
        }
        self.students
            .iter()
            .filter(|s| {
                [&s.id, &s.name, &s.grade, &s.notes]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&q))
            })
            .cloned()
            .collect()
    }

    pub fn filter(&self, filter: &StudentFilter) -> Vec<Student> {
        filter.apply(self.list_all())
    }

    /// Text search followed by the range filter.
    pub fn query(&self, text: &str, filter: &StudentFilter) -> Vec<Student> {
        filter.apply(self.search(text))
    }

    pub fn stats(&self) -> RosterStats {
        let total = self.students.len();
        let (average_age, average_gpa) = if total == 0 {
            (None, None)
        } else {
            let n = total as f64;
            let age_sum: i64 = self.students.iter().map(|s| s.age).sum();
            let gpa_sum: f64 = self.students.iter().map(|s| s.gpa).sum();
            (Some(age_sum as f64 / n), Some(gpa_sum / n))
        };

        let mut grades: BTreeMap<String, usize> = BTreeMap::new();
        for s in &self.students {
            *grades.entry(s.grade.trim().to_string()).or_default() += 1;
        }

        RosterStats {
            total,
            average_age,
            average_gpa,
            by_grade: grades
                .into_iter()
                .map(|(grade, count)| GradeCount { grade, count })
                .collect(),
        }
    }
}

fn load(path: &Path) -> Result<Vec<Student>> {
    let text = fs::read_to_string(path).map_err(|e| RosterError::io(path, e))?;
    let rows: Vec<Map<String, Value>> =
        serde_json::from_str(&text).map_err(|source| RosterError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let mut seen = HashSet::new();
    let mut students = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let corrupt = |reason: String| RosterError::Corrupt {
            path: path.to_path_buf(),
            index,
            reason,
        };
        let student = Student::from_serializable(row).map_err(|e| corrupt(e.to_string()))?;
        student.validate().map_err(|e| corrupt(e.to_string()))?;
        if !seen.insert(student.id.clone()) {
            return Err(corrupt(format!("duplicate id {}", student.id)));
        }
        students.push(student);
    }
    Ok(students)
}

/// Writes to `<file>.tmp` and renames over the target so readers never see
/// a half-written document.
fn write_atomic(path: &Path, students: &[Student]) -> Result<()> {
    let mut text = serde_json::to_string_pretty(students).map_err(|source| RosterError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    text.push('\n');

    let tmp = sibling(path, ".tmp");
    {
        let mut f = File::create(&tmp).map_err(|e| RosterError::io(&tmp, e))?;
        f.write_all(text.as_bytes())
            .and_then(|_| f.sync_all())
            .map_err(|e| RosterError::io(&tmp, e))?;
    }
    fs::rename(&tmp, path).map_err(|e| RosterError::io(path, e))?;
    Ok(())
}
