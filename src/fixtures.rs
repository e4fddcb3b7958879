#[cfg(test)]
pub mod test {
    use std::collections::{BTreeMap, HashMap};
    use std::path::PathBuf;

    use confique::Config;
    use serde::Deserialize;

    use crate::definition::ConfigDefinition;
    use crate::schema::{FieldDecl, GroupDecl, RootDecl, Shape};
    use crate::types::{ConfigPhase, ItemName, Primitive, ValueType};

    // -- Declarative roots ----------------------------------------------------

    /// A map-value group: `server.regions.{*}.*`.
    pub fn region_group() -> GroupDecl {
        GroupDecl::group("RegionConfig")
            .field(FieldDecl::new("label", Shape::Object(ValueType::String)))
            .field(
                FieldDecl::new("weight", Shape::Primitive(Primitive::Int))
                    .default("1")
                    .runtime_overridable(),
            )
    }

    /// `ServerConfig` → `server`, read at main.
    pub fn server_root() -> RootDecl {
        RootDecl::new(
            GroupDecl::new("ServerConfig")
                .field(
                    FieldDecl::new("threads", Shape::Primitive(Primitive::Int))
                        .default("10")
                        .doc("Worker threads."),
                )
                .field(FieldDecl::new("host", Shape::Object(ValueType::String)).default("localhost"))
                .field(
                    FieldDecl::new("maintenance", Shape::Primitive(Primitive::Boolean))
                        .runtime_overridable(),
                )
                .field(FieldDecl::new("regions", Shape::map_of(Shape::Group(region_group()))))
                .field(FieldDecl::new("tags", Shape::list_of(ValueType::String))),
        )
        .phase(ConfigPhase::RunTime)
    }

    pub fn rotation_group() -> GroupDecl {
        GroupDecl::group("RotationConfig")
            .field(FieldDecl::new("max_file_size", Shape::optional_of(ValueType::MemorySize)))
            .field(FieldDecl::new("max_backup_index", Shape::Primitive(Primitive::Int)).default("1"))
            .field(FieldDecl::new("file_suffix", Shape::optional_of(ValueType::String)))
            .field(FieldDecl::new("rotate_on_boot", Shape::Primitive(Primitive::Boolean)).default("true"))
    }

    /// `FileConfig` published under the dotted name `log.file`.
    pub fn file_root() -> RootDecl {
        let levels = ["OFF", "SEVERE", "WARNING", "INFO", "FINE", "ALL"]
            .map(String::from)
            .to_vec();
        RootDecl::new(
            GroupDecl::new("FileConfig")
                .field(FieldDecl::new("enable", Shape::Primitive(Primitive::Boolean)))
                .field(FieldDecl::new("format", Shape::Object(ValueType::String)).default("%d %-5p %m%n"))
                .field(FieldDecl::new("level", Shape::Object(ValueType::Enum(levels))).default("ALL"))
                .field(FieldDecl::new("path", Shape::Object(ValueType::Path)).default("app.log"))
                .field(FieldDecl::new("rotation", Shape::Group(rotation_group()))),
        )
        .named(ItemName::Explicit("log.file".into()))
        .phase(ConfigPhase::BuildAndRunTimeFixed)
    }

    /// `PackageConfig` → `package`, build time only.
    pub fn package_root() -> RootDecl {
        RootDecl::new(
            GroupDecl::new("PackageConfig")
                .field(
                    FieldDecl::new("kind", Shape::Object(ValueType::Enum(vec!["jar".into(), "native".into()])))
                        .default("jar"),
                )
                .field(FieldDecl::new("output_name", Shape::optional_of(ValueType::String))),
        )
    }

    /// Server, file and package roots, in that order.
    pub fn definition() -> ConfigDefinition {
        let mut def = ConfigDefinition::new();
        for root in [server_root(), file_root(), package_root()] {
            def.register_root(root).unwrap();
        }
        def
    }

    // -- Typed views for extraction -------------------------------------------

    #[derive(Deserialize, Debug, PartialEq)]
    pub struct ServerSettings {
        pub threads: i32,
        pub host: String,
        pub maintenance: bool,
        pub regions: BTreeMap<String, RegionSettings>,
        pub tags: Vec<String>,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    pub struct RegionSettings {
        pub label: String,
        pub weight: i32,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    pub struct FileSettings {
        pub enable: bool,
        pub format: String,
        pub level: String,
        pub path: PathBuf,
        pub rotation: RotationSettings,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    pub struct RotationSettings {
        pub max_file_size: Option<u64>,
        pub max_backup_index: i32,
        pub file_suffix: Option<String>,
        pub rotate_on_boot: bool,
    }

    // -- confique structs for introspection ------------------------------------

    #[derive(Config, Deserialize, Debug, PartialEq)]
    pub struct HttpConfig {
        /// The listen host.
        #[config(default = "localhost")]
        pub host: String,

        /// The port number.
        #[config(default = 8080)]
        pub port: u16,

        /// Enable debug mode.
        #[config(default = false)]
        pub debug: bool,

        /// Connection pool settings.
        #[config(nested)]
        pub pool: PoolConfig,
    }

    #[derive(Config, Deserialize, Debug, PartialEq)]
    pub struct PoolConfig {
        /// Connection string URL.
        pub url: Option<String>,

        /// Connection pool size.
        #[config(default = 5)]
        pub size: usize,

        #[config(default = 0.5)]
        pub idle_ratio: f64,

        #[config(default = ["primary", "replica"])]
        pub hosts: Vec<String>,
    }

    #[derive(Config, Deserialize, Debug, PartialEq)]
    pub struct ListenConfig {
        pub port: u16,
        pub retries: Option<u32>,
    }

    #[derive(Config, Deserialize, Debug, PartialEq)]
    pub struct LimitsConfig {
        #[config(default = { "read": 10, "write": 5 })]
        pub quotas: HashMap<String, u32>,
    }

    #[test]
    fn http_config_loads_defaults() {
        let config = HttpConfig::builder().load().unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
        assert!(!config.debug);
        assert_eq!(config.pool.url, None);
        assert_eq!(config.pool.size, 5);
        assert_eq!(config.pool.hosts, vec!["primary", "replica"]);
    }

    #[test]
    fn fixture_roots_register() {
        let def = definition();
        assert_eq!(def.roots().count(), 3);
    }
}
