//! Serde utilities for glam types.

use glam::{UVec3, Vec3};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serde proxy for Vec3
#[derive(Serialize, Deserialize)]
pub struct Vec3Def {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for Vec3Def {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<Vec3Def> for Vec3 {
    fn from(def: Vec3Def) -> Self {
        Vec3::new(def.x, def.y, def.z)
    }
}

pub fn serialize_vec3<S>(v: &Vec3, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    Vec3Def::from(*v).serialize(s)
}

pub fn deserialize_vec3<'de, D>(d: D) -> Result<Vec3, D::Error>
where
    D: Deserializer<'de>,
{
    Vec3Def::deserialize(d).map(Vec3::from)
}

/// Serde proxy for UVec3 (voxel dimensions and positions)
#[derive(Serialize, Deserialize)]
pub struct UVec3Def {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl From<UVec3> for UVec3Def {
    fn from(v: UVec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<UVec3Def> for UVec3 {
    fn from(def: UVec3Def) -> Self {
        UVec3::new(def.x, def.y, def.z)
    }
}

pub fn serialize_uvec3<S>(v: &UVec3, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    UVec3Def::from(*v).serialize(s)
}

pub fn deserialize_uvec3<'de, D>(d: D) -> Result<UVec3, D::Error>
where
    D: Deserializer<'de>,
{
    UVec3Def::deserialize(d).map(UVec3::from)
}

/// Optional voxel position; `None` serializes as `null`.
pub fn serialize_opt_uvec3<S>(v: &Option<UVec3>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    v.map(UVec3Def::from).serialize(s)
}

pub fn deserialize_opt_uvec3<'de, D>(d: D) -> Result<Option<UVec3>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<UVec3Def>::deserialize(d).map(|v| v.map(UVec3::from))
}
