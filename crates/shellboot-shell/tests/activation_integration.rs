use std::collections::BTreeMap;

use tempfile::tempdir;
use shellboot_shell::{ActivationScript, CompiledPrompt, EditMode, LineEditing, ShellKind};

#[test]
fn compiled_prompt_is_sourced_by_activation_script() {
    let temp_dir = tempdir().expect("create temp dir");
    let prompt_path = temp_dir.path().join("cache").join("prompt-init.sh");
    let script_path = temp_dir.path().join("data").join("activate.sh");

    let compiled = CompiledPrompt::compile(
        ShellKind::Zsh,
        "_omp_precmd() {\n  PROMPT=\"$(oh-my-posh print primary --shell=zsh)\"\n}\n",
    )
    .expect("prompt should compile");
    compiled.write_to(&prompt_path).expect("write compiled prompt");

    let environment = BTreeMap::from([("INSTANCE".to_string(), "dev".to_string())]);
    let mut script = ActivationScript::new(ShellKind::Zsh);
    script.add_environment(&environment);
    script.set_prompt(prompt_path.clone());
    script.set_line_editing(LineEditing {
        edit_mode: EditMode::Vi,
        ..LineEditing::default()
    });
    script.write(&script_path).expect("write activation script");

    let content = std::fs::read_to_string(&script_path).expect("read activation script");
    assert!(content.contains("export INSTANCE='dev'"));
    assert!(content.contains(&format!("source '{}'", prompt_path.display())));
    assert!(content.contains("bindkey -v"));
    assert!(prompt_path.exists());
}

#[test]
fn every_shell_renders_a_script() {
    let environment = BTreeMap::from([("DATABASE".to_string(), "main".to_string())]);

    for shell in ShellKind::ALL {
        let mut script = ActivationScript::new(shell);
        script.add_environment(&environment);
        script.set_line_editing(LineEditing::default());

        let rendered = script.render();

        assert!(rendered.contains("DATABASE"), "{shell}: {rendered}");
        assert!(rendered.ends_with('\n'));
    }
}
