use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::RecordError;

pub const MIN_AGE: i64 = 3;
pub const MAX_AGE: i64 = 120;
pub const MIN_GPA: f64 = 0.0;
pub const MAX_GPA: f64 = 100.0;

const FIELDS: [&str; 6] = ["id", "name", "age", "grade", "gpa", "notes"];

/// One learner's profile. Field order here is the key order of the backing file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub age: i64,
    /// Free-form: a numeric level ("10") or a letter ("A").
    pub grade: String,
    pub gpa: f64,
    pub notes: String,
}

impl Student {
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.id.trim().is_empty() {
            return Err(RecordError::validation("id", "must be a non-empty string"));
        }
        if self.name.trim().chars().count() < 2 {
            return Err(RecordError::validation(
                "name",
                "must be at least 2 characters",
            ));
        }
        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            return Err(RecordError::validation(
                "age",
                format!("must be an integer between {MIN_AGE} and {MAX_AGE}"),
            ));
        }
        if self.grade.trim().is_empty() {
            return Err(RecordError::validation("grade", "must be a non-empty string"));
        }
        // NaN fails the range check as well.
        if !(MIN_GPA..=MAX_GPA).contains(&self.gpa) {
            return Err(RecordError::validation(
                "gpa",
                format!("must be a number between {MIN_GPA} and {MAX_GPA}"),
            ));
        }
        Ok(())
    }

    pub fn to_serializable(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("id".into(), json!(self.id));
        map.insert("name".into(), json!(self.name));
        map.insert("age".into(), json!(self.age));
        map.insert("grade".into(), json!(self.grade));
        map.insert("gpa".into(), json!(self.gpa));
        map.insert("notes".into(), json!(self.notes));
        map
    }

    /// Builds a student from a JSON mapping, coercing `age` and `gpa`.
    /// Does not validate.
    pub fn from_serializable(map: &Map<String, Value>) -> Result<Self, RecordError> {
        if let Some(key) = map.keys().find(|k| !FIELDS.contains(&k.as_str())) {
            return Err(RecordError::UnknownField(key.clone()));
        }

        Ok(Student {
            id: optional_text("id", map.get("id"))?,
            name: coerce_text("name", required(map, "name")?)?,
            age: coerce_age(required(map, "age")?)?,
            grade: coerce_text("grade", required(map, "grade")?)?,
            gpa: coerce_gpa(required(map, "gpa")?)?,
            notes: optional_text("notes", map.get("notes"))?,
        })
    }
}

/// Partial update for an existing student. `id` is not patchable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub grade: Option<String>,
    pub gpa: Option<f64>,
    pub notes: Option<String>,
}

impl StudentPatch {
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, RecordError> {
        let mut patch = StudentPatch::default();
        for (key, value) in map {
            match key.as_str() {
                "id" => return Err(RecordError::validation("id", "cannot be changed")),
                "name" => patch.name = Some(coerce_text("name", value)?),
                "age" => patch.age = Some(coerce_age(value)?),
                "grade" => patch.grade = Some(coerce_text("grade", value)?),
                "gpa" => patch.gpa = Some(coerce_gpa(value)?),
                "notes" => patch.notes = Some(optional_text("notes", Some(value))?),
                _ => return Err(RecordError::UnknownField(key.clone())),
            }
        }
        Ok(patch)
    }

    pub fn apply_to(&self, student: &mut Student) {
        if let Some(name) = &self.name {
            student.name = name.clone();
        }
        if let Some(age) = self.age {
            student.age = age;
        }
        if let Some(grade) = &self.grade {
            student.grade = grade.clone();
        }
        if let Some(gpa) = self.gpa {
            student.gpa = gpa;
        }
        if let Some(notes) = &self.notes {
            student.notes = notes.clone();
        }
    }
}

fn required<'a>(map: &'a Map<String, Value>, field: &str) -> Result<&'a Value, RecordError> {
    map.get(field)
        .ok_or_else(|| RecordError::conversion(field, "missing"))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn coerce_text(field: &str, value: &Value) -> Result<String, RecordError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(RecordError::conversion(
            field,
            format!("expected string, got {}", kind(other)),
        )),
    }
}

/// Absent and null both mean empty.
fn optional_text(field: &str, value: Option<&Value>) -> Result<String, RecordError> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(v) => coerce_text(field, v),
    }
}

fn coerce_age(value: &Value) -> Result<i64, RecordError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                _ => Err(RecordError::conversion(
                    "age",
                    format!("{n} is not a whole number"),
                )),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| RecordError::conversion("age", format!("{s:?} is not an integer"))),
        other => Err(RecordError::conversion(
            "age",
            format!("expected integer, got {}", kind(other)),
        )),
    }
}

fn coerce_gpa(value: &Value) -> Result<f64, RecordError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| RecordError::conversion("gpa", format!("{n} is not a number"))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| RecordError::conversion("gpa", format!("{s:?} is not a number"))),
        other => Err(RecordError::conversion(
            "gpa",
            format!("expected number, got {}", kind(other)),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Student {
        Student {
            id: "a1b2c3d4".into(),
            name: "Ann Lee".into(),
            age: 16,
            grade: "10".into(),
            gpa: 88.5,
            notes: String::new(),
        }
    }

    fn map(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object")
    }

    fn failing_field(s: &Student) -> &'static str {
        match s.validate() {
            Err(RecordError::Validation { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let mut s = sample();
        for (age, gpa) in [(3, 0.0), (120, 100.0), (50, 42.25)] {
            s.age = age;
            s.gpa = gpa;
            assert!(s.validate().is_ok(), "age={age} gpa={gpa}");
        }
    }

    #[test]
    fn each_out_of_range_field_is_rejected() {
        let cases: Vec<(&str, Box<dyn Fn(&mut Student)>)> = vec![
            ("age", Box::new(|s: &mut Student| s.age = 2)),
            ("age", Box::new(|s: &mut Student| s.age = 121)),
            ("gpa", Box::new(|s: &mut Student| s.gpa = -0.1)),
            ("gpa", Box::new(|s: &mut Student| s.gpa = 100.1)),
            ("gpa", Box::new(|s: &mut Student| s.gpa = f64::NAN)),
            ("name", Box::new(|s: &mut Student| s.name = "a".into())),
            ("name", Box::new(|s: &mut Student| s.name = "  b  ".into())),
            ("grade", Box::new(|s: &mut Student| s.grade = String::new())),
            ("grade", Box::new(|s: &mut Student| s.grade = "   ".into())),
            ("id", Box::new(|s: &mut Student| s.id = String::new())),
        ];
        for (field, mutate) in cases {
            let mut s = sample();
            mutate(&mut s);
            assert_eq!(failing_field(&s), field);
        }
    }

    #[test]
    fn two_char_unicode_name_is_valid() {
        let mut s = sample();
        s.name = "李明".into();
        assert!(s.validate().is_ok());
    }

    #[test]
    fn serializable_roundtrip() {
        let mut s = sample();
        s.notes = "transferred in March".into();
        let back = Student::from_serializable(&s.to_serializable()).expect("from map");
        assert_eq!(back, s);
    }

    #[test]
    fn from_serializable_coerces_numeric_strings() {
        let s = Student::from_serializable(&map(json!({
            "id": "x1",
            "name": "Bo Chen",
            "age": " 17 ",
            "grade": "B",
            "gpa": "91.5"
        })))
        .expect("coerce");
        assert_eq!(s.age, 17);
        assert_eq!(s.gpa, 91.5);
        assert_eq!(s.notes, "");
    }

    #[test]
    fn from_serializable_accepts_integral_float_age_and_integer_gpa() {
        let s = Student::from_serializable(&map(json!({
            "id": "x1", "name": "Bo Chen", "age": 16.0, "grade": "B", "gpa": 90
        })))
        .expect("coerce");
        assert_eq!(s.age, 16);
        assert_eq!(s.gpa, 90.0);
    }

    #[test]
    fn from_serializable_reports_conversion_failures() {
        let bad_age = Student::from_serializable(&map(json!({
            "id": "x1", "name": "Bo Chen", "age": "seventeen", "grade": "B", "gpa": 1
        })));
        assert!(matches!(
            bad_age,
            Err(RecordError::Conversion { ref field, .. }) if field == "age"
        ));

        let fractional = Student::from_serializable(&map(json!({
            "id": "x1", "name": "Bo Chen", "age": 16.5, "grade": "B", "gpa": 1
        })));
        assert!(matches!(fractional, Err(RecordError::Conversion { .. })));

        let missing_gpa = Student::from_serializable(&map(json!({
            "id": "x1", "name": "Bo Chen", "age": 16, "grade": "B"
        })));
        assert!(matches!(
            missing_gpa,
            Err(RecordError::Conversion { ref field, .. }) if field == "gpa"
        ));

        let numeric_name = Student::from_serializable(&map(json!({
            "id": "x1", "name": 42, "age": 16, "grade": "B", "gpa": 1
        })));
        assert!(matches!(numeric_name, Err(RecordError::Conversion { .. })));
    }

    #[test]
    fn from_serializable_does_not_validate() {
        let s = Student::from_serializable(&map(json!({
            "name": "a", "age": 500, "grade": "", "gpa": 150
        })))
        .expect("no validation here");
        assert!(s.validate().is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Student::from_serializable(&map(json!({
            "id": "x1", "name": "Bo Chen", "age": 16, "grade": "B", "gpa": 1, "email": "b@c"
        })))
        .unwrap_err();
        assert_eq!(err, RecordError::UnknownField("email".into()));

        let err = StudentPatch::from_map(&map(json!({ "nickname": "Bo" }))).unwrap_err();
        assert_eq!(err, RecordError::UnknownField("nickname".into()));
    }

    #[test]
    fn patch_coerces_and_applies_only_present_fields() {
        let patch = StudentPatch::from_map(&map(json!({ "age": "17", "notes": null })))
            .expect("patch");
        assert_eq!(patch.age, Some(17));
        assert_eq!(patch.notes, Some(String::new()));
        assert!(patch.name.is_none());

        let mut s = sample();
        s.notes = "old".into();
        patch.apply_to(&mut s);
        assert_eq!(s.age, 17);
        assert_eq!(s.notes, "");
        assert_eq!(s.name, "Ann Lee");
    }

    #[test]
    fn patch_refuses_id_changes() {
        let err = StudentPatch::from_map(&map(json!({ "id": "other" }))).unwrap_err();
        assert!(matches!(err, RecordError::Validation { field: "id", .. }));
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let patch = StudentPatch::from_map(&Map::new()).expect("patch");
        let mut s = sample();
        patch.apply_to(&mut s);
        assert_eq!(s, sample());
    }
}
