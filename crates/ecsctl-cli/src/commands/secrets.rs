//! `ecsctl secrets store|dump`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context as _, Result};

use ecsctl_core::{PutParameterRequest, SsmApi};
use ecsctl_spec::{VarLut, dump_secrets, render_dumped_secrets};

use super::{Context, SpecVars};

/// Store every top-level `name: value` of the spec as a `SecureString`.
pub async fn store(ctx: &Context, spec_file: &Path, vars: &SpecVars) -> Result<()> {
    let secrets = vars
        .loader()?
        .secrets(spec_file)
        .with_context(|| format!("loading {}", spec_file.display()))?;

    for (name, value) in &secrets {
        println!("🔑 Storing secret {name}.");
        let response = ctx
            .clients
            .ssm
            .put_parameter(&PutParameterRequest::secure(name, value))
            .await
            .with_context(|| format!("storing secret {name}"))?;
        println!("\t✅ done, parameter version: {}", response.version);
    }
    Ok(())
}

/// Write every parameter matching `filter` to `target` as a spec file,
/// with variable values in names turned back into `{{ var }}` expressions.
pub async fn dump(
    ctx: &Context,
    target: &Path,
    vars: &SpecVars,
    filter: Option<&str>,
) -> Result<()> {
    let loader = vars.loader()?;
    let lut = VarLut::new(loader.vars());
    let secrets = dump_secrets(&ctx.clients.ssm, filter)
        .await
        .context("reading secrets")?;

    let file =
        File::create(target).with_context(|| format!("creating {}", target.display()))?;
    let mut out = BufWriter::new(file);
    let keys = render_dumped_secrets(&secrets, &lut, &mut out)
        .with_context(|| format!("writing {}", target.display()))?;
    out.flush()
        .with_context(|| format!("writing {}", target.display()))?;
    for key in &keys {
        println!("🔑 Dumped secret {key}.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;

    use ecsctl_client::{Clients, Simulator};
    use ecsctl_core::{EcsctlConfig, Operation};

    fn dry_run(simulator: &Arc<Simulator>) -> Context {
        Context {
            clients: Clients::simulated(Arc::clone(simulator)),
            config: EcsctlConfig::default(),
        }
    }

    #[tokio::test]
    async fn store_writes_secure_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.yaml");
        fs::write(&path, "/{{ env }}/db/password: hunter2\n/{{ env }}/api/key: abc\n").unwrap();
        let simulator = Arc::new(Simulator::new());
        let vars = SpecVars {
            vars: vec!["env=test".into()],
            ..Default::default()
        };

        store(&dry_run(&simulator), &path, &vars).await.unwrap();

        let calls = simulator.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.operation == Operation::PutParameter));
        assert_eq!(calls[0].request["Name"], "/test/api/key");
        assert_eq!(calls[0].request["Type"], "SecureString");
        assert_eq!(calls[0].request["Overwrite"], true);
    }

    #[tokio::test]
    async fn dump_creates_target_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("dump.yaml");
        let simulator = Arc::new(Simulator::new());

        dump(&dry_run(&simulator), &target, &SpecVars::default(), Some("/test/"))
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "");
        assert_eq!(simulator.calls()[0].operation, Operation::DescribeParameters);
    }
}
