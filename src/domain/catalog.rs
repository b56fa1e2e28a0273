//! Reference rows read back from the store

use crate::domain::ids::{DepartmentId, DoctorId, HospitalId};
use serde::{Deserialize, Serialize};

/// Department as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDepartment {
    pub id: DepartmentId,
    pub hospital_id: HospitalId,
    pub code: String,
    pub name: String,
}

/// Doctor as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDoctor {
    pub id: DoctorId,
    pub hospital_id: HospitalId,
    pub department_id: DepartmentId,
    pub doctor_no: String,
    pub name: String,
}
