//! A miniature mpdecimal 2.4.2 source release.
//!
//! The build-control files carry every line the patch rules target, copied
//! from the upstream release, so drift checks against this fixture mean
//! something. Source files are omitted; nothing here is ever compiled.

use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::sources::tarball::{extract_tarball, SOURCE_SUBFOLDER};

/// Top-level directory inside the release tarball.
pub const FIXTURE_TOP_DIR: &str = "mpdecimal-2.4.2";

pub const CONFIGURE: &str = r#"#! /bin/sh
# Guess values for system-dependent variables and create Makefiles.
# Generated by GNU Autoconf 2.69 for mpdecimal 2.4.2.

LIBSTATIC=libmpdec.a
LIBNAME="libmpdec.so"
LIBSONAME="libmpdec.so.2"
LIBSHARED="libmpdec.so.2.4.2"

case $host in
  *darwin*)
    LIBNAME="libmpdec.dylib"
    LIBSONAME="libmpdec.2.dylib"
    LIBSHARED="libmpdec.2.4.2.dylib"
    ;;
esac

ac_config_files="$ac_config_files Makefile libmpdec/Makefile tests/Makefile"
"#;

pub const MAKEFILE_IN: &str = "\
# ==============================================================================
#                          Unix Makefile for libmpdec
# ==============================================================================

LIBSTATIC = @LIBSTATIC@
LIBSHARED = @LIBSHARED@
LIBSONAME = @LIBSONAME@

INSTALL = @INSTALL@
prefix = @prefix@
exec_prefix = @exec_prefix@
includedir = @includedir@
libdir = @libdir@
datarootdir = @datarootdir@
docdir = @docdir@

default: FORCE
\tcd libmpdec && $(MAKE)

check: default
\tcd tests && $(MAKE)

install: FORCE
\t$(INSTALL) -d -m 755 $(DESTDIR)$(includedir)
\t$(INSTALL) -m 644 libmpdec/mpdecimal.h $(DESTDIR)$(includedir)
\t$(INSTALL) -d -m 755 $(DESTDIR)$(libdir)
\t$(INSTALL) -m 644 libmpdec/$(LIBSTATIC) $(DESTDIR)$(libdir)
\t$(INSTALL) -m 755 libmpdec/$(LIBSHARED) $(DESTDIR)$(libdir)
\tcd $(DESTDIR)$(libdir) && ln -sf $(LIBSHARED) $(LIBSONAME) && ln -sf $(LIBSHARED) libmpdec.so
\t$(INSTALL) -d -m 755 $(DESTDIR)$(docdir)
\tcp -R doc/* $(DESTDIR)$(docdir)

clean: FORCE
\tcd libmpdec && $(MAKE) clean

FORCE:
";

pub const LIBMPDEC_MAKEFILE_IN: &str = "\
# ==============================================================================
#                          Unix Makefile for libmpdec
# ==============================================================================

LIBSTATIC = @LIBSTATIC@
LIBSHARED = @LIBSHARED@
LIBSONAME = @LIBSONAME@

CC = @CC@
LD = @LD@
AR = @AR@
MPD_HEADER = @MPD_HEADER@

CONFIGURE_CFLAGS = @CONFIGURE_CFLAGS@ $(CFLAGS)
CONFIGURE_LDFLAGS = @CONFIGURE_LDFLAGS@ $(LDFLAGS)

OBJS := basearith.o context.o constants.o convolute.o crt.o mpdecimal.o \\
        mpsignal.o difradix2.o fnt.o fourstep.o io.o memory.o numbertheory.o \\
        sixstep.o transpose.o

default: $(LIBSTATIC) $(LIBSHARED)

$(LIBSTATIC): Makefile $(OBJS)
\t$(AR) rc $(LIBSTATIC) $(OBJS)
\tranlib $(LIBSTATIC)

$(LIBSHARED): Makefile $(OBJS)
\t$(LD) $(CONFIGURE_LDFLAGS) -o $(LIBSHARED) $(OBJS) -lm
\tln -sf $(LIBSHARED) libmpdec.so
\tln -sf $(LIBSHARED) $(LIBSONAME)

clean: FORCE
\trm -f *.o *.gch libmpdec.a libmpdec.so* mpdecimal.h

FORCE:
";

pub const LIBMPDEC_MAKEFILE_VC: &str = "\
# ======================================================================
#                      Visual C (nmake) Makefile for libmpdec
# ======================================================================

LIBSTATIC = libmpdec-2.4.2.lib
LIBIMPORT = libmpdec-2.4.2.dll.lib
LIBSHARED = libmpdec-2.4.2.dll

OBJS = basearith.obj context.obj constants.obj convolute.obj crt.obj \\
       mpdecimal.obj mpsignal.obj difradix2.obj fnt.obj fourstep.obj io.obj \\
       memory.obj numbertheory.obj sixstep.obj transpose.obj

!if \"$(DEBUG)\" == \"1\"
OPT = /MTd /Od /Zi
OPT_SHARED = /MDd /Od /Zi
!else
OPT = /MT /Ox /GS /EHsc
OPT_SHARED = /MD /Ox /GS /EHsc
!endif

!if \"$(DLL)\" == \"1\"
default: $(LIBSHARED)
!else
default: $(LIBSTATIC)
!endif

$(LIBSTATIC): Makefile $(OBJS)
\tlib /out:$(LIBSTATIC) $(OBJS)

$(LIBSHARED): Makefile $(OBJS)
\tlink /DLL /out:$(LIBSHARED) /implib:$(LIBIMPORT) $(OBJS)
";

pub const MPDECIMAL_H: &str = "\
#ifndef MPDECIMAL_H
#define MPDECIMAL_H

#define MPD_VERSION \"2.4.2\"

#endif /* MPDECIMAL_H */
";

pub const VCCOMPAT_H: &str = "\
#ifndef VCCOMPAT_H
#define VCCOMPAT_H

#ifdef _MSC_VER
  #define snprintf sprintf_s
#endif

#endif /* VCCOMPAT_H */
";

pub const LICENSE_TXT: &str = "\
Copyright (c) 2008-2016 Stefan Krah. All rights reserved.

Redistribution and use in source and binary forms, with or without
modification, are permitted provided that the following conditions
are met:
";

/// Files of the fixture release, relative to its top directory.
pub fn fixture_files() -> Vec<(&'static str, String)> {
    vec![
        ("configure", CONFIGURE.to_string()),
        ("Makefile.in", MAKEFILE_IN.to_string()),
        ("LICENSE.txt", LICENSE_TXT.to_string()),
        ("libmpdec/Makefile.in", LIBMPDEC_MAKEFILE_IN.to_string()),
        ("libmpdec/Makefile.vc", LIBMPDEC_MAKEFILE_VC.to_string()),
        ("libmpdec/mpdecimal.h", MPDECIMAL_H.to_string()),
        ("libmpdec/vccompat.h", VCCOMPAT_H.to_string()),
        ("vcbuild/README.txt", "Build with nmake from libmpdec/.\n".to_string()),
    ]
}

/// The fixture release as a `.tar.gz`.
pub fn fixture_tarball() -> Vec<u8> {
    tarball_from(&fixture_files())
}

/// A release whose build files no longer contain what the rules expect.
pub fn drifted_tarball() -> Vec<u8> {
    let files = fixture_files()
        .into_iter()
        .map(|(path, contents)| {
            let contents = if path == "libmpdec/Makefile.in" {
                contents.replace(
                    "default: $(LIBSTATIC) $(LIBSHARED)",
                    "all: $(LIBSTATIC) $(LIBSHARED)",
                )
            } else {
                contents
            };
            (path, contents)
        })
        .collect::<Vec<_>>();
    tarball_from(&files)
}

/// Extract the fixture into `<build_dir>/source_subfolder`.
pub fn extract_fixture(build_dir: &Path) {
    let dest = build_dir.join(SOURCE_SUBFOLDER);
    if dest.exists() {
        std::fs::remove_dir_all(&dest).unwrap();
    }
    extract_tarball(&fixture_tarball(), &dest, Some(FIXTURE_TOP_DIR)).unwrap();
}

fn tarball_from(files: &[(&str, String)]) -> Vec<u8> {
    let mut data = Vec::new();
    {
        let encoder = GzEncoder::new(&mut data, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (path, contents) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(if *path == "configure" { 0o755 } else { 0o644 });
            header.set_cksum();
            builder
                .append_data(
                    &mut header,
                    format!("{}/{}", FIXTURE_TOP_DIR, path),
                    contents.as_bytes(),
                )
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }
    data
}
