//! Request schemas and validation for the UniNear API.
//!
//! Every inbound body is checked here before any remote call is made. The
//! validators walk the whole payload and report *every* offending field in a
//! single [`ValidationError`] rather than stopping at the first problem.
//!
//! # Schemas
//!
//! | Schema | Required | Optional (default) |
//! |--------|----------|--------------------|
//! | [`EventCreate`] | `title`, `date`, `location`, `capacity`, `price` | `description`, `end_time`, `status` (`"Draft"`), `mood_tags` (`[]`), `energy_level`, `organiser_id` |
//! | [`EventUpdate`] | - | every mutable event field, no defaults |
//! | [`SignupRequest`] | `email`, `password` | `full_name` |
//! | [`LoginRequest`] | `email`, `password` | - |
//!
//! `start_time` is accepted as an alias for `date`. Unknown fields are ignored.

use std::error::Error;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::types::{Record, Timestamp};

/// Status given to events created without an explicit one.
pub const DEFAULT_EVENT_STATUS: &str = "Draft";

/// Wire name of the event start field.
pub const DATE_FIELD: &str = "date";

/// Accepted alias for [`DATE_FIELD`].
pub const START_TIME_FIELD: &str = "start_time";

/// Pseudo-field used when the body itself is unusable.
const BODY_FIELD: &str = "body";

// ============================================================================
// Errors
// ============================================================================

/// Why a single field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    /// A required field was absent.
    Missing,
    /// The field was present but could not be coerced to its declared type.
    Invalid,
}

/// A rejected field with a human readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub kind: FieldErrorKind,
    pub message: String,
}

impl FieldError {
    fn missing(field: &str) -> Self {
        Self {
            field: field.to_string(),
            kind: FieldErrorKind::Missing,
            message: "field required".to_string(),
        }
    }

    fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            kind: FieldErrorKind::Invalid,
            message: message.into(),
        }
    }
}

/// A request body failed validation.
///
/// Holds one [`FieldError`] per offending field, in the order the schema
/// declares its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

impl ValidationError {
    /// Creates a validation error from a list of field errors.
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// Returns the individual field errors.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Names of the fields reported with the given kind.
    pub fn fields_with_kind(&self, kind: FieldErrorKind) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|err| err.kind == kind)
            .map(|err| err.field.as_str())
            .collect()
    }

    /// Names of the required fields that were absent.
    pub fn missing_fields(&self) -> Vec<&str> {
        self.fields_with_kind(FieldErrorKind::Missing)
    }

    /// Names of the fields whose value could not be coerced.
    pub fn invalid_fields(&self) -> Vec<&str> {
        self.fields_with_kind(FieldErrorKind::Invalid)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request validation failed")?;
        for (i, err) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{} ({})", err.field, err.message)?;
        }
        Ok(())
    }
}

impl Error for ValidationError {}

// ============================================================================
// Schemas
// ============================================================================

/// A validated event-create request.
///
/// The start time keeps its wire name (`date`) until the handler renames it
/// for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct EventCreate {
    pub title: String,
    pub description: Option<String>,
    pub date: Timestamp,
    pub end_time: Option<Timestamp>,
    pub location: String,
    pub capacity: i64,
    pub price: f64,
    pub status: String,
    pub mood_tags: Vec<String>,
    pub energy_level: Option<String>,
    pub organiser_id: Option<String>,
}

impl EventCreate {
    /// Converts the request into a store record.
    ///
    /// Optional fields that were not supplied are left out so the store can
    /// apply its own column defaults.
    pub fn into_record(self) -> Record {
        let mut record = Record::new();
        record.insert("title".into(), Value::from(self.title));
        if let Some(description) = self.description {
            record.insert("description".into(), Value::from(description));
        }
        record.insert(DATE_FIELD.into(), self.date.into());
        if let Some(end_time) = self.end_time {
            record.insert("end_time".into(), end_time.into());
        }
        record.insert("location".into(), Value::from(self.location));
        record.insert("capacity".into(), Value::from(self.capacity));
        record.insert("price".into(), Value::from(self.price));
        record.insert("status".into(), Value::from(self.status));
        record.insert("mood_tags".into(), Value::from(self.mood_tags));
        if let Some(energy_level) = self.energy_level {
            record.insert("energy_level".into(), Value::from(energy_level));
        }
        if let Some(organiser_id) = self.organiser_id {
            record.insert("organiser_id".into(), Value::from(organiser_id));
        }
        record
    }
}

/// A validated event-update request.
///
/// `None` means "not supplied, leave the stored value alone". Nullable
/// columns use `Some(None)` for an explicit `null` that clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub date: Option<Timestamp>,
    pub end_time: Option<Option<Timestamp>>,
    pub location: Option<String>,
    pub capacity: Option<i64>,
    pub price: Option<f64>,
    pub status: Option<String>,
    pub mood_tags: Option<Vec<String>>,
    pub energy_level: Option<Option<String>>,
    pub organiser_id: Option<Option<String>>,
}

impl EventUpdate {
    /// Converts the request into a partial record holding only supplied fields.
    pub fn into_record(self) -> Record {
        fn put<T: Into<Value>>(record: &mut Record, key: &str, value: Option<T>) {
            if let Some(value) = value {
                record.insert(key.to_string(), value.into());
            }
        }

        fn put_nullable<T: Into<Value>>(record: &mut Record, key: &str, value: Option<Option<T>>) {
            if let Some(value) = value {
                record.insert(key.to_string(), value.map_or(Value::Null, Into::into));
            }
        }

        let mut record = Record::new();
        put(&mut record, "title", self.title);
        put_nullable(&mut record, "description", self.description);
        put(&mut record, DATE_FIELD, self.date);
        put_nullable(&mut record, "end_time", self.end_time);
        put(&mut record, "location", self.location);
        put(&mut record, "capacity", self.capacity);
        put(&mut record, "price", self.price);
        put(&mut record, "status", self.status);
        put(&mut record, "mood_tags", self.mood_tags);
        put_nullable(&mut record, "energy_level", self.energy_level);
        put_nullable(&mut record, "organiser_id", self.organiser_id);
        record
    }

    /// Number of fields the caller supplied.
    pub fn field_count(&self) -> usize {
        [
            self.title.is_some(),
            self.description.is_some(),
            self.date.is_some(),
            self.end_time.is_some(),
            self.location.is_some(),
            self.capacity.is_some(),
            self.price.is_some(),
            self.status.is_some(),
            self.mood_tags.is_some(),
            self.energy_level.is_some(),
            self.organiser_id.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    /// Returns `true` when no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.field_count() == 0
    }
}

/// A validated signup request.
#[derive(Clone, PartialEq, Eq)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("full_name", &self.full_name)
            .finish()
    }
}

/// A validated login request.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// Validators
// ============================================================================

/// Parses a raw request body into a JSON object.
///
/// # Errors
///
/// Returns a [`ValidationError`] on the `body` field if the bytes are not
/// valid JSON or the top-level value is not an object.
pub fn parse_body(bytes: &[u8]) -> Result<Record, ValidationError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(_) => Err(ValidationError::new(vec![FieldError::invalid(
            BODY_FIELD,
            "expected a JSON object",
        )])),
        Err(err) => Err(ValidationError::new(vec![FieldError::invalid(
            BODY_FIELD,
            format!("malformed JSON: {err}"),
        )])),
    }
}

/// Validates an event-create payload and applies defaults.
///
/// # Errors
///
/// Returns a [`ValidationError`] listing every missing required field and
/// every field whose value cannot be coerced.
pub fn validate_create(payload: &Record) -> Result<EventCreate, ValidationError> {
    let mut fields = Fields::new(payload);

    let title = fields.required("title", TEXT);
    let description = fields.optional("description", TEXT);
    let date = fields.start_time(true);
    let end_time = fields.optional("end_time", TIMESTAMP);
    let location = fields.required("location", TEXT);
    let capacity = fields.required("capacity", INTEGER);
    let price = fields.required("price", NUMBER);
    let status = fields.optional("status", TEXT);
    let mood_tags = fields.optional("mood_tags", TEXT_LIST);
    let energy_level = fields.optional("energy_level", TEXT);
    let organiser_id = fields.optional("organiser_id", TEXT);

    let errors = fields.into_errors();
    match (title, date, location, capacity, price) {
        (Some(title), Some(date), Some(location), Some(capacity), Some(price))
            if errors.is_empty() =>
        {
            Ok(EventCreate {
                title,
                description,
                date,
                end_time,
                location,
                capacity,
                price,
                status: status.unwrap_or_else(|| DEFAULT_EVENT_STATUS.to_string()),
                mood_tags: mood_tags.unwrap_or_default(),
                energy_level,
                organiser_id,
            })
        }
        _ => Err(ValidationError::new(errors)),
    }
}

/// Validates an event-update payload.
///
/// Every field is optional and nothing is defaulted: the result carries only
/// what the caller sent.
///
/// # Errors
///
/// Returns a [`ValidationError`] for values that cannot be coerced, or for
/// `null` on a column that cannot be cleared.
pub fn validate_update(payload: &Record) -> Result<EventUpdate, ValidationError> {
    let mut fields = Fields::new(payload);

    let update = EventUpdate {
        title: fields.present("title", TEXT),
        description: fields.nullable("description", TEXT),
        date: fields.start_time(false),
        end_time: fields.nullable("end_time", TIMESTAMP),
        location: fields.present("location", TEXT),
        capacity: fields.present("capacity", INTEGER),
        price: fields.present("price", NUMBER),
        status: fields.present("status", TEXT),
        mood_tags: fields.present("mood_tags", TEXT_LIST),
        energy_level: fields.nullable("energy_level", TEXT),
        organiser_id: fields.nullable("organiser_id", TEXT),
    };

    fields.finish().map(|()| update)
}

/// Validates a signup payload.
///
/// Only types are checked; credential rules are left to the identity provider.
///
/// # Errors
///
/// Returns a [`ValidationError`] when `email` or `password` is missing or not
/// text, or `full_name` is not text.
pub fn validate_signup(payload: &Record) -> Result<SignupRequest, ValidationError> {
    let mut fields = Fields::new(payload);

    let email = fields.required("email", TEXT);
    let password = fields.required("password", TEXT);
    let full_name = fields.optional("full_name", TEXT);

    let errors = fields.into_errors();
    match (email, password) {
        (Some(email), Some(password)) if errors.is_empty() => Ok(SignupRequest {
            email,
            password,
            full_name,
        }),
        _ => Err(ValidationError::new(errors)),
    }
}

/// Validates a login payload.
///
/// # Errors
///
/// Returns a [`ValidationError`] when `email` or `password` is missing or not
/// text.
pub fn validate_login(payload: &Record) -> Result<LoginRequest, ValidationError> {
    let mut fields = Fields::new(payload);

    let email = fields.required("email", TEXT);
    let password = fields.required("password", TEXT);

    let errors = fields.into_errors();
    match (email, password) {
        (Some(email), Some(password)) if errors.is_empty() => {
            Ok(LoginRequest { email, password })
        }
        _ => Err(ValidationError::new(errors)),
    }
}

// ============================================================================
// Field extraction
// ============================================================================

/// A coercion from a JSON value to a field type, with the expected-type text
/// used in error messages.
type Coerce<T> = (fn(&Value) -> Option<T>, &'static str);

const TEXT: Coerce<String> = (as_text, "expected a string");
const INTEGER: Coerce<i64> = (as_integer, "expected an integer");
const NUMBER: Coerce<f64> = (as_number, "expected a number");
const TIMESTAMP: Coerce<Timestamp> = (as_timestamp, "expected an ISO-8601 datetime");
const TEXT_LIST: Coerce<Vec<String>> = (as_text_list, "expected a list of strings");

/// Walks a payload field by field, collecting errors as it goes.
struct Fields<'a> {
    payload: &'a Record,
    errors: Vec<FieldError>,
}

impl<'a> Fields<'a> {
    fn new(payload: &'a Record) -> Self {
        Self {
            payload,
            errors: Vec::new(),
        }
    }

    fn coerce<T>(&mut self, name: &str, value: &Value, (convert, expected): Coerce<T>) -> Option<T> {
        let converted = convert(value);
        if converted.is_none() {
            self.errors.push(FieldError::invalid(name, expected));
        }
        converted
    }

    /// Absent or `null` is reported as missing.
    fn required<T>(&mut self, name: &str, coerce: Coerce<T>) -> Option<T> {
        let payload = self.payload;
        match payload.get(name) {
            None | Some(Value::Null) => {
                self.errors.push(FieldError::missing(name));
                None
            }
            Some(value) => self.coerce(name, value, coerce),
        }
    }

    /// Absent or `null` yields `None`.
    fn optional<T>(&mut self, name: &str, coerce: Coerce<T>) -> Option<T> {
        let payload = self.payload;
        match payload.get(name) {
            None | Some(Value::Null) => None,
            Some(value) => self.coerce(name, value, coerce),
        }
    }

    /// Absent yields `None`; `null` is rejected because the column cannot be
    /// cleared.
    fn present<T>(&mut self, name: &str, coerce: Coerce<T>) -> Option<T> {
        let payload = self.payload;
        match payload.get(name) {
            None => None,
            Some(Value::Null) => {
                self.errors
                    .push(FieldError::invalid(name, "field cannot be null"));
                None
            }
            Some(value) => self.coerce(name, value, coerce),
        }
    }

    /// Absent yields `None`; `null` yields `Some(None)`.
    fn nullable<T>(&mut self, name: &str, coerce: Coerce<T>) -> Option<Option<T>> {
        let payload = self.payload;
        match payload.get(name) {
            None => None,
            Some(Value::Null) => Some(None),
            Some(value) => self.coerce(name, value, coerce).map(Some),
        }
    }

    /// Reads the event start from `date` or its `start_time` alias.
    ///
    /// Errors are always reported against `date`, the documented wire name.
    fn start_time(&mut self, required: bool) -> Option<Timestamp> {
        let payload = self.payload;
        let date = payload.get(DATE_FIELD);
        let alias = payload.get(START_TIME_FIELD);

        let value = match (date, alias) {
            (Some(_), Some(_)) => {
                self.errors.push(FieldError::invalid(
                    DATE_FIELD,
                    "give either 'date' or 'start_time', not both",
                ));
                return None;
            }
            (Some(value), None) | (None, Some(value)) => value,
            (None, None) => {
                if required {
                    self.errors.push(FieldError::missing(DATE_FIELD));
                }
                return None;
            }
        };

        match value {
            Value::Null if required => {
                self.errors.push(FieldError::missing(DATE_FIELD));
                None
            }
            Value::Null => {
                self.errors
                    .push(FieldError::invalid(DATE_FIELD, "field cannot be null"));
                None
            }
            value => self.coerce(DATE_FIELD, value, TIMESTAMP),
        }
    }

    fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.errors))
        }
    }
}

fn as_text(value: &Value) -> Option<String> {
    value.as_str().map(str::to_owned)
}

/// Integers, integral floats, and strings holding an integer.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Any JSON number, or a string holding a finite number.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// ISO-8601 strings or integer Unix seconds.
fn as_timestamp(value: &Value) -> Option<Timestamp> {
    match value {
        Value::String(s) => Timestamp::parse(s),
        Value::Number(n) => n.as_i64().and_then(Timestamp::from_unix_seconds),
        _ => None,
    }
}

fn as_text_list(value: &Value) -> Option<Vec<String>> {
    value.as_array()?.iter().map(as_text).collect()
}
