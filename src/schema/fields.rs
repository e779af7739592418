//! Field catalogue for the student enrollment schema.
//!
//! The order of [`FEATURES`] is the training column order and must never be
//! rearranged; persisted artifacts record it and inference checks it.

/// Number of fields in the enrollment schema.
pub const FEATURE_COUNT: usize = 35;

/// Domain constraint attached to a schema field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Finite set of accepted integer codes.
    Categorical(&'static [i64]),
    /// Closed numeric interval, boundaries included.
    Numeric { min: f64, max: f64 },
}

/// Single named field with its domain.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Column name as it appears in datasets and request payloads.
    pub name: &'static str,
    /// Accepted value domain.
    pub kind: FieldKind,
}

const YES_NO: &[i64] = &[0, 1];

const MARITAL_STATUS: &[i64] = &[1, 2, 3, 4, 5, 6];

const APPLICATION_MODE: &[i64] = &[
    1, 2, 5, 7, 10, 15, 16, 17, 18, 26, 27, 39, 42, 43, 44, 51, 53, 57,
];

const APPLICATION_ORDER: &[i64] = &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9];

const COURSE: &[i64] = &[
    33, 171, 8014, 9003, 9070, 9085, 9119, 9130, 9147, 9238, 9254, 9500, 9556, 9670, 9773, 9853,
    9991,
];

const PREVIOUS_QUALIFICATION: &[i64] = &[
    1, 2, 3, 4, 5, 6, 9, 10, 12, 14, 15, 19, 38, 39, 40, 42, 43,
];

const NACIONALITY: &[i64] = &[
    1, 2, 6, 11, 13, 14, 17, 21, 22, 24, 25, 26, 32, 41, 62, 100, 101, 103, 105, 108, 109,
];

const MOTHER_QUALIFICATION: &[i64] = &[
    1, 2, 3, 4, 5, 6, 9, 10, 11, 12, 14, 18, 19, 22, 26, 27, 29, 30, 34, 35, 36, 37, 38, 39, 40,
    41, 42, 43, 44,
];

const FATHER_QUALIFICATION: &[i64] = &[
    1, 2, 3, 4, 5, 6, 9, 10, 11, 12, 13, 14, 18, 19, 20, 22, 25, 26, 27, 29, 30, 31, 33, 34, 35,
    36, 37, 38, 39, 40, 41, 42, 43, 44,
];

const MOTHER_OCCUPATION: &[i64] = &[
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 90, 99, 122, 123, 125, 131, 132, 134, 141, 143, 144, 151,
    152, 153, 171, 173, 175, 191, 192, 193, 194,
];

const FATHER_OCCUPATION: &[i64] = &[
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 90, 99, 101, 102, 103, 112, 114, 121, 122, 123, 124, 131,
    132, 134, 135, 141, 143, 144, 151, 152, 153, 154, 161, 163, 171, 172, 174, 175, 181, 182, 183,
    192, 193, 194, 195,
];

/// Ordered catalogue of every schema field.
///
/// Categorical codes and numeric ranges follow the institutional intake form;
/// grades are on the Portuguese 0-200 admission / 0-20 semester scales.
pub const FEATURES: [FieldSpec; FEATURE_COUNT] = [
    FieldSpec {
        name: "marital_status",
        kind: FieldKind::Categorical(MARITAL_STATUS),
    },
    FieldSpec {
        name: "application_mode",
        kind: FieldKind::Categorical(APPLICATION_MODE),
    },
    FieldSpec {
        name: "application_order",
        kind: FieldKind::Categorical(APPLICATION_ORDER),
    },
    FieldSpec {
        name: "course",
        kind: FieldKind::Categorical(COURSE),
    },
    FieldSpec {
        name: "daytime_evening_attendance",
        kind: FieldKind::Categorical(YES_NO),
    },
    FieldSpec {
        name: "previous_qualification",
        kind: FieldKind::Categorical(PREVIOUS_QUALIFICATION),
    },
    FieldSpec {
        name: "previous_qualification_grade",
        kind: FieldKind::Numeric { min: 0.0, max: 200.0 },
    },
    FieldSpec {
        name: "nacionality",
        kind: FieldKind::Categorical(NACIONALITY),
    },
    FieldSpec {
        name: "mother_s_qualification",
        kind: FieldKind::Categorical(MOTHER_QUALIFICATION),
    },
    FieldSpec {
        name: "father_s_qualification",
        kind: FieldKind::Categorical(FATHER_QUALIFICATION),
    },
    FieldSpec {
        name: "mother_s_occupation",
        kind: FieldKind::Categorical(MOTHER_OCCUPATION),
    },
    FieldSpec {
        name: "father_s_occupation",
        kind: FieldKind::Categorical(FATHER_OCCUPATION),
    },
    FieldSpec {
        name: "admission_grade",
        kind: FieldKind::Numeric { min: 0.0, max: 200.0 },
    },
    FieldSpec {
        name: "displaced",
        kind: FieldKind::Categorical(YES_NO),
    },
    FieldSpec {
        name: "educational_special_needs",
        kind: FieldKind::Categorical(YES_NO),
    },
    FieldSpec {
        name: "debtor",
        kind: FieldKind::Categorical(YES_NO),
    },
    FieldSpec {
        name: "tuition_fees_up_to_date",
        kind: FieldKind::Categorical(YES_NO),
    },
    FieldSpec {
        name: "gender",
        kind: FieldKind::Categorical(YES_NO),
    },
    FieldSpec {
        name: "scholarship_holder",
        kind: FieldKind::Categorical(YES_NO),
    },
    FieldSpec {
        name: "age_at_enrollment",
        kind: FieldKind::Numeric { min: 17.0, max: 70.0 },
    },
    FieldSpec {
        name: "curricular_units_1st_sem_credited",
        kind: FieldKind::Numeric { min: 0.0, max: 20.0 },
    },
    FieldSpec {
        name: "curricular_units_1st_sem_enrolled",
        kind: FieldKind::Numeric { min: 0.0, max: 26.0 },
    },
    FieldSpec {
        name: "curricular_units_1st_sem_evaluations",
        kind: FieldKind::Numeric { min: 0.0, max: 45.0 },
    },
    FieldSpec {
        name: "curricular_units_1st_sem_approved",
        kind: FieldKind::Numeric { min: 0.0, max: 26.0 },
    },
    FieldSpec {
        name: "curricular_units_1st_sem_grade",
        kind: FieldKind::Numeric { min: 0.0, max: 20.0 },
    },
    FieldSpec {
        name: "curricular_units_1st_sem_without_evaluations",
        kind: FieldKind::Numeric { min: 0.0, max: 12.0 },
    },
    FieldSpec {
        name: "curricular_units_2nd_sem_credited",
        kind: FieldKind::Numeric { min: 0.0, max: 19.0 },
    },
    FieldSpec {
        name: "curricular_units_2nd_sem_enrolled",
        kind: FieldKind::Numeric { min: 0.0, max: 23.0 },
    },
    FieldSpec {
        name: "curricular_units_2nd_sem_evaluations",
        kind: FieldKind::Numeric { min: 0.0, max: 33.0 },
    },
    FieldSpec {
        name: "curricular_units_2nd_sem_approved",
        kind: FieldKind::Numeric { min: 0.0, max: 20.0 },
    },
    FieldSpec {
        name: "curricular_units_2nd_sem_grade",
        kind: FieldKind::Numeric { min: 0.0, max: 20.0 },
    },
    FieldSpec {
        name: "curricular_units_2nd_sem_without_evaluations",
        kind: FieldKind::Numeric { min: 0.0, max: 12.0 },
    },
    FieldSpec {
        name: "unemployment_rate",
        kind: FieldKind::Numeric { min: 7.6, max: 16.2 },
    },
    FieldSpec {
        name: "inflation_rate",
        kind: FieldKind::Numeric { min: -0.8, max: 3.7 },
    },
    FieldSpec {
        name: "gdp",
        kind: FieldKind::Numeric { min: -4.06, max: 3.51 },
    },
];
