use std::{error::Error, fs::File, io::Write};

use mpmem_memory::{
    CollisionPolicy, MemoryEngine, MultiReadMemory, MultiportXorMemory, ReadPort, StorageDescriptor, WritePort,
};
use mpmem_netlist::Design;

struct Options {
    writers: usize,
    readers: usize,
    depth: usize,
    width: usize,
    granularity: Option<usize>,
    transparent: bool,
    lowest_index_wins: bool,
    stats: bool,
    output: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            writers: 2,
            readers: 2,
            depth: 16,
            width: 8,
            granularity: None,
            transparent: false,
            lowest_index_wins: false,
            stats: false,
            output: String::new(),
        }
    }
}

fn check_options(options: &Options) -> Result<(), Box<dyn Error>> {
    if options.granularity == Some(0) {
        return Err("write granularity must be positive".into());
    }
    if options.lowest_index_wins && options.writers <= 1 {
        log::warn!("--lowest-index-wins has no effect with {} write port(s)", options.writers);
    }
    Ok(())
}

fn create_engine(options: &Options, descriptor: StorageDescriptor, design: &Design) -> Box<dyn MemoryEngine> {
    let clk = design.add_input("clk", 1).unwrap_net();
    if options.writers <= 1 {
        Box::new(MultiReadMemory::new(descriptor, clk).with_name("mem"))
    } else {
        let collision_policy =
            if options.lowest_index_wins { CollisionPolicy::LowestIndexWins } else { CollisionPolicy::Unresolved };
        Box::new(MultiportXorMemory::new(descriptor, clk).with_name("mem").with_collision_policy(collision_policy))
    }
}

fn build_design(options: &Options) -> Result<Design, Box<dyn Error>> {
    let mut design = Design::new();
    let descriptor = StorageDescriptor::new(options.width, options.depth)?;
    let (addr_width, width) = (descriptor.addr_width(), descriptor.width());
    let mut memory = create_engine(options, descriptor, &design);

    let mut write_handles = vec![];
    for index in 0..options.writers {
        let addr = design.add_input(format!("waddr{index}"), addr_width);
        let data = design.add_input(format!("wdata{index}"), width);
        let port = match options.granularity {
            None => WritePort::new(addr, data, design.add_input(format!("we{index}"), 1).unwrap_net()),
            Some(granularity) => {
                let enable = design.add_input(format!("we{index}"), width / granularity);
                WritePort::with_granularity(addr, data, enable, granularity)
            }
        };
        write_handles.push(memory.write_port(port)?);
    }
    for index in 0..options.readers {
        let addr = design.add_input(format!("raddr{index}"), addr_width);
        let enable = design.add_input(format!("re{index}"), 1).unwrap_net();
        let mut port = ReadPort::new(addr, enable);
        if options.transparent {
            port = port.transparent_for(write_handles.iter().copied());
        }
        memory.read_port(port)?;
    }

    let topology = memory.build(&design)?;
    for (index, data) in topology.all_read_data().iter().enumerate() {
        design.add_output(format!("rdata{index}"), data);
    }
    design.apply();
    log::info!("built {} primitive bank(s)", topology.bank_count());
    Ok(design)
}

fn write_statistics(writer: &mut impl Write, design: &Design) -> std::io::Result<()> {
    writeln!(writer, "; cell counts:")?;
    for (class, amount) in design.statistics() {
        writeln!(writer, "; {:>7} {}", amount, class)?;
    }
    Ok(())
}

fn write_output(design: Design, options: &Options) -> Result<(), Box<dyn Error>> {
    if options.output.is_empty() {
        let mut stdout = std::io::stdout().lock();
        if !options.stats {
            write!(stdout, "{design}")?;
        }
        write_statistics(&mut stdout, &design)?;
    } else {
        let mut file = File::create(&options.output)?;
        if options.stats {
            write_statistics(&mut file, &design)?;
        } else {
            write!(file, "{design}")?;
        }
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut version = false;
    let mut options = Options::default();
    {
        let mut parser = argparse::ArgumentParser::new();
        parser.set_description("Build a memory with many ports out of single-port banks and print its netlist.");
        parser.refer(&mut version).add_option(&["--version"], argparse::StoreTrue, "Display version");
        parser.refer(&mut options.writers).add_option(&["-w", "--writers"], argparse::Store, "Number of write ports");
        parser.refer(&mut options.readers).add_option(&["-r", "--readers"], argparse::Store, "Number of read ports");
        parser.refer(&mut options.depth).add_option(&["-d", "--depth"], argparse::Store, "Number of rows");
        parser.refer(&mut options.width).add_option(&["-b", "--width"], argparse::Store, "Width of a row in bits");
        parser.refer(&mut options.granularity).add_option(
            &["-g", "--granularity"],
            argparse::StoreOption,
            "Width of the chunks enabled by each write enable bit",
        );
        parser.refer(&mut options.transparent).add_option(
            &["--transparent"],
            argparse::StoreTrue,
            "Make read ports observe same-cycle writes",
        );
        parser.refer(&mut options.lowest_index_wins).add_option(
            &["--lowest-index-wins"],
            argparse::StoreTrue,
            "Resolve same-row writes in favor of the lowest-numbered write port",
        );
        parser.refer(&mut options.stats).add_option(&["--stats"], argparse::StoreTrue, "Only print cell counts");
        parser.refer(&mut options.output).add_argument("OUTPUT", argparse::Store, "Output file");
        parser.parse_args_or_exit();
    }

    if version {
        println!("mpmem {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    check_options(&options)?;
    let design = build_design(&options)?;
    write_output(design, &options)?;
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(error) = run() {
        eprintln!("error: {}", error);
        std::process::exit(1)
    }
}
