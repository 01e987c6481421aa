//! Marshalling runtime context
//!
//! A `NativeRuntime` fixes the target platform for everything built from it:
//! its data model sizes layouts and scalar references, its alias table
//! resolves portable type names, and its enum registry caches enum mappings.

use crate::alias::{TypeAlias, TypeAliasTable};
use crate::config::MarshalConfig;
use crate::enums::{EnumEntry, EnumRegistry, NativeEnum};
use crate::error::Result;
use crate::memory::BufferPool;
use crate::platform::{DataModel, Platform};
use crate::types::{NativeType, TypeInfo};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct NativeRuntime {
    platform: Platform,
    model: DataModel,
    aliases: &'static TypeAliasTable,
    enums: Arc<EnumRegistry>,
    config: MarshalConfig,
}

impl NativeRuntime {
    /// Runtime for the host platform with default settings
    pub fn host() -> Result<Self> {
        Self::from_config(&MarshalConfig::default())
    }

    /// Runtime targeting a specific platform
    pub fn for_platform(platform: Platform) -> Result<Self> {
        Self::build(platform, MarshalConfig::default())
    }

    /// Runtime described by a config, host platform unless overridden
    pub fn from_config(config: &MarshalConfig) -> Result<Self> {
        let platform = config.platform.resolve()?;
        Self::build(platform, config.clone())
    }

    fn build(platform: Platform, config: MarshalConfig) -> Result<Self> {
        let aliases = TypeAliasTable::for_platform(platform)?;
        let model = platform.data_model();
        info!(
            event = "runtime_init",
            platform = %platform,
            address_size = model.address_size,
            long_size = model.long_size,
            "Native marshalling runtime initialized"
        );

        Ok(Self {
            platform,
            model,
            aliases,
            enums: Arc::new(EnumRegistry::new()),
            config,
        })
    }

    /// Share an enum registry with other runtimes
    pub fn with_enum_registry(mut self, registry: Arc<EnumRegistry>) -> Self {
        self.enums = registry;
        self
    }

    #[inline]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    #[inline]
    pub fn data_model(&self) -> &DataModel {
        &self.model
    }

    #[inline]
    pub fn address_size(&self) -> usize {
        self.model.address_size
    }

    #[inline]
    pub fn long_size(&self) -> usize {
        self.model.long_size
    }

    #[inline]
    pub fn aliases(&self) -> &'static TypeAliasTable {
        self.aliases
    }

    #[inline]
    pub fn config(&self) -> &MarshalConfig {
        &self.config
    }

    /// Concrete type of a portable alias on this runtime's platform
    pub fn resolve_alias(&self, alias: TypeAlias) -> Result<NativeType> {
        self.aliases.get(alias)
    }

    #[inline]
    pub fn type_info(&self, ty: NativeType) -> TypeInfo {
        ty.info(&self.model)
    }

    pub fn alias_info(&self, alias: TypeAlias) -> Result<TypeInfo> {
        Ok(self.type_info(self.resolve_alias(alias)?))
    }

    #[inline]
    pub fn enums(&self) -> &EnumRegistry {
        &self.enums
    }

    pub fn enum_entry<E: NativeEnum>(&self) -> Result<Arc<EnumEntry<E>>> {
        self.enums.entry::<E>()
    }

    /// A fresh buffer pool built from the `[pool]` settings
    pub fn new_pool(&self) -> Box<dyn BufferPool + Send> {
        self.config.pool.build()
    }
}
