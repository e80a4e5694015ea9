//! One launch-and-inject run against real processes.

use crate::Plan;
use anyhow::Context;
use loader_core::injection::InjectionOverride;
use loader_core::{
    release_instances, run_injection_phase, InjectionPhase, LaunchedProcess, Launcher,
    LoaderContext, RemoteThreadInjector, Win32Spawner,
};

pub fn run(plan: &Plan) -> anyhow::Result<()> {
    let context = LoaderContext::init(plan.knowledge.as_deref(), plan.request.executable())
        .context("Failed to initialize loader")?;

    context.print_game_info();

    let launcher = Launcher::new(Win32Spawner).with_poll_interval(plan.poll_interval);
    let processes = launcher
        .launch(&plan.request, plan.suspended)
        .context("Failed to launch game")?;

    for (index, process) in processes.iter().enumerate() {
        println!("Instance {}: PID {}", index + 1, process.pid());
    }

    inject(&context, plan, &processes)?;

    release_instances(processes, plan.suspended, |processes| {
        context.shutdown(processes)
    })
    .context("Failed to release game instances")
}

fn inject(
    context: &LoaderContext,
    plan: &Plan,
    processes: &[LaunchedProcess],
) -> anyhow::Result<()> {
    let injector =
        RemoteThreadInjector::new(context.module_loader()).with_write_policy(plan.write_policy);

    let override_hook = context.injection_override();
    let override_hook = override_hook
        .as_ref()
        .map(|hook| hook as &dyn InjectionOverride<LaunchedProcess>);

    let phase = run_injection_phase(override_hook, &injector, &plan.libraries, processes)
        .context("Injection aborted")?;

    match phase {
        InjectionPhase::Overridden => {
            println!("Libraries injected by the knowledge library.");
        }
        InjectionPhase::Completed(report) if report.environment_unsupported() => {
            println!(
                "Library injection is not supported in this environment \
                 (remote memory allocation is not implemented)."
            );
        }
        InjectionPhase::Completed(report) => {
            for library in report.libraries() {
                println!("{}", library);
            }

            if report.is_success() {
                println!("All libraries have been successfully injected.");
            } else {
                println!("Some or all libraries failed to inject.");
            }
        }
    }

    Ok(())
}
