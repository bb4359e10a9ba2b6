use reader::{
    tables::{Row, TableTag},
    ClassFile, DecodingError,
};

use crate::Opts;

/// Print the structure of `class` on the standard output.
pub fn dump(class: &ClassFile, opts: &Opts) -> Result<(), DecodingError> {
    let constants = class.constant_pool();
    let pool = class.attribute_pool();

    print!("class {}", class.class_name()?);
    if let Some(super_class) = class.super_class_name()? {
        print!(" extends {}", super_class);
    }
    let interfaces = class.interfaces_names()?;
    if !interfaces.is_empty() {
        print!(" implements {}", interfaces.join(", "));
    }
    println!();
    println!(
        "  version: {}.{}",
        class.major_version(),
        class.minor_version()
    );
    println!("  flags: {:?}", class.access_flags());
    println!(
        "  constant pool: {} slots, {} entries",
        constants.count().saturating_sub(1),
        constants.tables().row_count()
    );

    println!("fields:");
    for field in class.fields() {
        println!(
            "  {} {} {:?}",
            field.name(constants)?,
            field.descriptor(constants)?,
            field.access_flags
        );
        for attribute in &field.attributes {
            println!("    {}", attribute);
        }
    }

    println!("methods:");
    for method in class.methods() {
        println!(
            "  {}{} {:?}",
            method.name(constants)?,
            method.descriptor(constants)?,
            method.access_flags
        );
        if let Some(code) = method.code(pool)? {
            println!(
                "    code: max_stack={} max_locals={} {} bytes, {} handlers",
                code.max_stack()?,
                code.max_locals()?,
                code.code()?.len(),
                code.exception_table()?.len()
            );
        }
        for attribute in &method.attributes {
            println!("    {}", attribute);
        }
    }

    println!("attributes:");
    for attribute in class.attributes() {
        println!("  {}", attribute);
    }

    if opts.constants {
        println!("constant pool:");
        for index in constants.tables().row_indexes() {
            let row = constants.tables().row_by_index(index)?;
            println!("  {}", format_row(row));
        }
    }

    if opts.attributes {
        println!("attribute pool:");
        for table in pool.tables().iter() {
            println!("  {} ({} rows)", table.tag(), table.len());
            for row in table.rows() {
                println!("    {}", format_row(row));
            }
        }
    }
    Ok(())
}

fn format_row<T: TableTag>(row: &Row<T>) -> String {
    let cells: Vec<String> = row
        .cells()
        .iter()
        .map(|cell| format!("{}={}", cell.column().name(), cell.value()))
        .collect();
    format!("#{} {} {}", row.index(), row.table(), cells.join(" "))
}
