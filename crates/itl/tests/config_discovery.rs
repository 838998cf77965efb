use std::fs;

use itl::{find_itl_toml, read_itl_toml, Dialect, ItlError, CONFIG_FILE_NAME};

#[test]
fn finds_config_in_an_ancestor_directory() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let nested = tmp.path().join("profiles").join("work");
    fs::create_dir_all(&nested).expect("create dirs");
    let config = tmp.path().join(CONFIG_FILE_NAME);
    fs::write(
        &config,
        "[compile]\ndialect = \"inline_execution\"\nallow_unterminated_function_calls = true\n",
    )
    .expect("write config");

    let found = find_itl_toml(&nested).expect("config found");
    assert_eq!(found, config);

    let loaded = read_itl_toml(&found).expect("config parses");
    assert_eq!(loaded.compile.dialect, Dialect::InlineExecution);
    assert!(loaded.compile.allow_unterminated_function_calls);

    let compilation = loaded.compile.compile("open(");
    assert!(!compilation.has_errors());
}

#[test]
fn nearest_config_wins() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let nested = tmp.path().join("inner");
    fs::create_dir_all(&nested).expect("create dirs");
    fs::write(tmp.path().join(CONFIG_FILE_NAME), "[compile]\ndialect = \"standard\"\n")
        .expect("write outer");
    fs::write(
        nested.join(CONFIG_FILE_NAME),
        "[compile]\ndialect = \"single_function\"\n",
    )
    .expect("write inner");

    let found = find_itl_toml(&nested).expect("config found");
    let loaded = read_itl_toml(&found).expect("config parses");
    assert_eq!(loaded.compile.dialect, Dialect::SingleFunction);
}

#[test]
fn malformed_config_reports_its_path() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = tmp.path().join(CONFIG_FILE_NAME);
    fs::write(&config, "[compile\n").expect("write config");

    let err = read_itl_toml(&config).unwrap_err();
    match err {
        ItlError::Config(message) => {
            assert!(message.starts_with("failed to parse"), "{message}");
            assert!(message.contains(CONFIG_FILE_NAME), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_config_file_is_an_io_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let err = read_itl_toml(&tmp.path().join(CONFIG_FILE_NAME)).unwrap_err();
    assert!(matches!(err, ItlError::Io(_)));
}
